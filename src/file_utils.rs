use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::translation::MetadataCache;

// @module: File and directory utilities

/// Extension of diagram project documents
pub const DIAGRAM_MODEL_EXTENSION: &str = ".uml.json";

/// Kind of document a path points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentType {
    /// SVG vector graphic
    Svg,
    /// Diagram project (`*.uml.json`)
    DiagramModel,
    /// Anything else
    Unsupported,
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @detects: Document type from the file name
    pub fn detect_document_type<P: AsRef<Path>>(path: P) -> DocumentType {
        let name = path
            .as_ref()
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if name.ends_with(DIAGRAM_MODEL_EXTENSION) {
            DocumentType::DiagramModel
        } else if name.ends_with(".svg") {
            DocumentType::Svg
        } else {
            DocumentType::Unsupported
        }
    }

    /// Find every supported document below a directory, sorted by path.
    ///
    /// Hidden entries, metadata files and outputs of a previous run
    /// (file stem ending with `output_suffix`) are left out.
    pub fn find_documents<P: AsRef<Path>>(dir: P, output_suffix: &str) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let mut documents = Vec::new();

        let walker = WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !Self::is_hidden(entry.path()));

        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to walk directory: {:?}", dir))?;
            let path = entry.path();
            if !entry.file_type().is_file() || MetadataCache::is_metadata_file(path) {
                continue;
            }
            if Self::detect_document_type(path) == DocumentType::Unsupported {
                continue;
            }
            if !output_suffix.is_empty() && Self::document_stem(path).ends_with(output_suffix) {
                continue;
            }
            documents.push(path.to_path_buf());
        }

        documents.sort();
        Ok(documents)
    }

    /// Output path next to `input`: `<stem><suffix><ext>`.
    ///
    /// Without `force` an existing file is never reused; `_1`, `_2`, ... are
    /// appended until a free name is found.
    pub fn generate_output_path<P: AsRef<Path>>(input: P, suffix: &str, force: bool) -> PathBuf {
        let input = input.as_ref();
        let stem = Self::document_stem(input);
        let extension = Self::document_extension(input);
        let candidate = |counter: Option<usize>| {
            let name = match counter {
                Some(n) => format!("{}{}_{}{}", stem, suffix, n, extension),
                None => format!("{}{}{}", stem, suffix, extension),
            };
            input.with_file_name(name)
        };

        let first = candidate(None);
        if force || !first.exists() {
            return first;
        }
        (1..)
            .map(|n| candidate(Some(n)))
            .find(|path| !path.exists())
            .unwrap_or(first)
    }

    // @copies: File, creating the destination directory
    pub fn copy_file<P1: AsRef<Path>, P2: AsRef<Path>>(from: P1, to: P2) -> Result<()> {
        let from = from.as_ref();
        let to = to.as_ref();
        if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
            Self::ensure_dir(parent)?;
        }
        fs::copy(from, to).with_context(|| format!("Failed to copy {:?} to {:?}", from, to))?;
        Ok(())
    }

    /// Write a file through a temporary sibling so readers never see a
    /// partial document
    pub fn write_atomic<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::ensure_dir(&dir)?;

        let mut temp = NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to create temporary file in {:?}", dir))?;
        temp.write_all(content)
            .and_then(|_| temp.flush())
            .with_context(|| format!("Failed to write {:?}", path))?;
        temp.persist(path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to replace {:?}", path))?;
        Ok(())
    }

    fn is_hidden(path: &Path) -> bool {
        path.file_name()
            .map(|n| n.to_string_lossy().starts_with('.'))
            .unwrap_or(false)
    }

    // @returns: File name without the document extension (`a.uml.json` -> `a`)
    fn document_stem(path: &Path) -> String {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension_len = Self::document_extension(path).len();
        name[..name.len() - extension_len].to_string()
    }

    fn document_extension(path: &Path) -> String {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if name.to_lowercase().ends_with(DIAGRAM_MODEL_EXTENSION) {
            return name[name.len() - DIAGRAM_MODEL_EXTENSION.len()..].to_string();
        }
        path.extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default()
    }
}
