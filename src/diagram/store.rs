/*!
 * Loading and saving diagram projects.
 *
 * A project is only reachable through a `ProjectHandle`. The handle releases
 * itself when dropped, so every exit path of a pass (including early `?`
 * returns) closes it.
 */

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::debug;
use tempfile::NamedTempFile;
use thiserror::Error;

use super::model::Project;

#[derive(Error, Debug)]
pub enum ModelStoreError {
    #[error("Cannot access project file: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid project file: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Project handle is already closed")]
    Closed,
}

/// Storage backend for diagram projects
pub trait ModelStore: Send + Sync {
    /// Open a project, returning a handle that owns it
    fn open(&self, path: &Path) -> Result<ProjectHandle, ModelStoreError>;

    /// Write the project held by `handle` to `path`
    fn save(&self, handle: &ProjectHandle, path: &Path) -> Result<(), ModelStoreError>;
}

/// Open project plus the registration in its store's handle counter
#[derive(Debug)]
pub struct ProjectHandle {
    project: Project,
    source: PathBuf,
    open_handles: Arc<AtomicUsize>,
    closed: bool,
}

impl ProjectHandle {
    fn register(project: Project, source: PathBuf, open_handles: Arc<AtomicUsize>) -> Self {
        open_handles.fetch_add(1, Ordering::SeqCst);
        Self { project, source, open_handles, closed: false }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn project_mut(&mut self) -> &mut Project {
        &mut self.project
    }

    /// File the project was loaded from
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn is_open(&self) -> bool {
        !self.closed
    }

    /// Release the handle; further calls are no-ops
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.open_handles.fetch_sub(1, Ordering::SeqCst);
            debug!("Closed project {}", self.source.display());
        }
    }
}

impl Drop for ProjectHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// Store for the JSON project format (`*.uml.json`)
#[derive(Debug, Clone, Default)]
pub struct JsonModelStore {
    open_handles: Arc<AtomicUsize>,
}

impl JsonModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles opened by this store (or its clones) that are not closed yet
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }
}

impl ModelStore for JsonModelStore {
    fn open(&self, path: &Path) -> Result<ProjectHandle, ModelStoreError> {
        let content = std::fs::read_to_string(path)?;
        let project: Project = serde_json::from_str(&content)?;
        debug!(
            "Opened project {} ({} elements, {} diagrams)",
            path.display(),
            project.model.len(),
            project.diagrams.len()
        );
        Ok(ProjectHandle::register(project, path.to_path_buf(), Arc::clone(&self.open_handles)))
    }

    fn save(&self, handle: &ProjectHandle, path: &Path) -> Result<(), ModelStoreError> {
        if !handle.is_open() {
            return Err(ModelStoreError::Closed);
        }

        let mut json = serde_json::to_string_pretty(handle.project())?;
        json.push('\n');

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut temp = NamedTempFile::new_in(&dir)?;
        temp.write_all(json.as_bytes())?;
        temp.flush()?;
        temp.persist(path).map_err(|e| e.error)?;

        debug!("Saved project to {}", path.display());
        Ok(())
    }
}
