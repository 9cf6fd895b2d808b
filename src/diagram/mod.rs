/*!
 * Diagram model documents (`*.uml.json`).
 *
 * - `model`: project, element arena and diagram types
 * - `store`: project loading and saving behind the `ModelStore` trait
 * - `handlers`: per-diagram-kind extraction and application
 * - `extract` / `apply`: the two passes over a whole project
 */

pub mod apply;
pub mod extract;
pub mod handlers;
pub mod model;
pub mod store;

use std::path::Path;

use crate::errors::PipelineError;
use crate::language_utils::Script;
use crate::translation::document::{ApplyReport, TranslationMap};
use crate::translation::pipeline::{DocumentFormat, Extraction};

pub use handlers::{DiagramHandler, HandlerRegistry};
pub use model::{Diagram, DiagramKind, ElementKind, ModelArena, ModelElement, Project};
pub use store::{JsonModelStore, ModelStore, ModelStoreError, ProjectHandle};

/// Diagram projects as a pipeline document format
#[derive(Debug)]
pub struct DiagramFormat<S = JsonModelStore> {
    store: S,
    registry: HandlerRegistry,
    source: Script,
    target: Script,
}

impl DiagramFormat<JsonModelStore> {
    pub fn new(source: Script, target: Script) -> Self {
        Self::with_store(JsonModelStore::new(), source, target)
    }
}

impl<S: ModelStore> DiagramFormat<S> {
    pub fn with_store(store: S, source: Script, target: Script) -> Self {
        Self { store, registry: HandlerRegistry::default(), source, target }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.registry
    }
}

impl<S: ModelStore> DocumentFormat for DiagramFormat<S> {
    fn name(&self) -> &'static str {
        "diagram"
    }

    fn extract(&self, input: &Path) -> Result<Extraction, PipelineError> {
        let handle = self.store
            .open(input)
            .map_err(|e| PipelineError::extraction(input, e))?;
        Ok(extract::extract_project(handle.project(), &self.registry, self.source))
    }

    fn apply(&self, input: &Path, output: &Path, translations: &TranslationMap) -> Result<ApplyReport, PipelineError> {
        let mut handle = self.store
            .open(input)
            .map_err(|e| PipelineError::application(input, e))?;

        let report = apply::apply_project(
            handle.project_mut(),
            &self.registry,
            translations,
            self.source,
            self.target,
        );

        self.store
            .save(&handle, output)
            .map_err(|e| PipelineError::application(output, e))?;
        handle.close();
        Ok(report)
    }
}
