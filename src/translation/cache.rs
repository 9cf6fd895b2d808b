/*!
 * Per-document translation metadata.
 *
 * Every source document gets a `<file name>.meta.json` next to it holding a
 * content fingerprint and the translations obtained so far, keyed by the
 * stable unit id. An entry is reused only while its original text still
 * matches the freshly extracted one.
 */

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::errors::PipelineError;

use super::document::TextUnit;

const METADATA_SUFFIX: &str = ".meta.json";
const HASH_BUFFER_SIZE: usize = 8192;

/// Cached translation of one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationCacheEntry {
    pub id: String,
    pub original_text: String,
    pub translated_text: String,
}

/// Persisted metadata of one source document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// SHA-256 of the document bytes the entries were computed from
    #[serde(default)]
    pub original_file_hash: String,

    /// Epoch milliseconds of the last update
    #[serde(default)]
    pub last_modified: i64,

    /// Entries keyed by unit id
    #[serde(default)]
    pub translations: BTreeMap<String, TranslationCacheEntry>,
}

impl DocumentMetadata {
    /// Stored translation for `id`, if its original text still matches
    pub fn lookup(&self, id: &str, original_text: &str) -> Option<&str> {
        self.translations
            .get(id)
            .filter(|entry| entry.original_text == original_text)
            .map(|entry| entry.translated_text.as_str())
    }

    /// Rebuild the entries from every unit that carries a translation
    pub fn rebuild(units: &[TextUnit], fingerprint: &str) -> Self {
        let translations = units
            .iter()
            .filter_map(|unit| {
                unit.translated_text.as_ref().map(|translated| {
                    (
                        unit.id.clone(),
                        TranslationCacheEntry {
                            id: unit.id.clone(),
                            original_text: unit.original_text.clone(),
                            translated_text: translated.clone(),
                        },
                    )
                })
            })
            .collect();

        Self {
            original_file_hash: fingerprint.to_string(),
            last_modified: chrono::Utc::now().timestamp_millis(),
            translations,
        }
    }

    pub fn len(&self) -> usize {
        self.translations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }
}

/// Loads and stores `DocumentMetadata` next to its document
#[derive(Debug, Clone, Default)]
pub struct MetadataCache;

impl MetadataCache {
    pub fn new() -> Self {
        Self
    }

    /// Location of the metadata file for a document
    pub fn metadata_path(document: &Path) -> PathBuf {
        let mut name = document
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(METADATA_SUFFIX);
        document.with_file_name(name)
    }

    /// Whether a path is itself a metadata file
    pub fn is_metadata_file(path: &Path) -> bool {
        path.file_name()
            .map(|n| n.to_string_lossy().ends_with(METADATA_SUFFIX))
            .unwrap_or(false)
    }

    /// Load the metadata of a document.
    ///
    /// Never fails: a missing or unreadable record yields an empty one.
    pub fn load(&self, document: &Path) -> DocumentMetadata {
        let path = Self::metadata_path(document);

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No metadata found at {}", path.display());
                return DocumentMetadata::default();
            }
            Err(e) => {
                warn!("Failed to read metadata {}: {}", path.display(), e);
                return DocumentMetadata::default();
            }
        };

        match serde_json::from_str::<DocumentMetadata>(&content) {
            Ok(metadata) => {
                debug!(
                    "Loaded {} cached translations from {}",
                    metadata.len(),
                    path.display()
                );
                metadata
            }
            Err(e) => {
                warn!("Ignoring corrupt metadata {}: {}", path.display(), e);
                DocumentMetadata::default()
            }
        }
    }

    /// Persist the metadata of a document atomically
    pub fn save(&self, document: &Path, metadata: &DocumentMetadata) -> Result<(), PipelineError> {
        let path = Self::metadata_path(document);
        let json = serde_json::to_string_pretty(metadata)
            .map_err(|e| PipelineError::persistence(&path, e))?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut temp = NamedTempFile::new_in(&dir).map_err(|e| PipelineError::persistence(&path, e))?;
        temp.write_all(json.as_bytes())
            .and_then(|_| temp.flush())
            .map_err(|e| PipelineError::persistence(&path, e))?;
        temp.persist(&path)
            .map_err(|e| PipelineError::persistence(&path, e.error))?;

        debug!("Saved {} translations to {}", metadata.len(), path.display());
        Ok(())
    }

    /// SHA-256 hex digest of the document bytes
    pub fn fingerprint(&self, document: &Path) -> io::Result<String> {
        let mut file = File::open(document)?;
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; HASH_BUFFER_SIZE];

        loop {
            let read = file.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(format!("{:x}", hasher.finalize()))
    }
}
