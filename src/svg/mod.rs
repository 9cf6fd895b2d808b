/*!
 * SVG documents.
 *
 * - `dom`: lossless arena DOM over quick-xml events
 * - `extract`: target location shared by both passes
 * - `apply`: overlay rewrite of `<text>` and foreignObject spans
 * - `style`: injected hover styles and clipboard script
 */

pub mod apply;
pub mod dom;
pub mod extract;
pub mod style;

use std::fs;
use std::path::Path;

use log::debug;

use crate::errors::PipelineError;
use crate::file_utils::FileManager;
use crate::language_utils::Script;
use crate::translation::document::{ApplyReport, TranslationMap};
use crate::translation::pipeline::{DocumentFormat, Extraction};

pub use dom::{SvgDocument, SvgError};

/// SVG files as a pipeline document format
#[derive(Debug, Clone, Copy)]
pub struct SvgFormat {
    source: Script,
    target: Script,
}

impl SvgFormat {
    pub fn new(source: Script, target: Script) -> Self {
        Self { source, target }
    }

    fn load(path: &Path) -> Result<SvgDocument, String> {
        let bytes = fs::read(path).map_err(|e| e.to_string())?;
        SvgDocument::parse(&bytes).map_err(|e| e.to_string())
    }
}

impl DocumentFormat for SvgFormat {
    fn name(&self) -> &'static str {
        "svg"
    }

    fn extract(&self, input: &Path) -> Result<Extraction, PipelineError> {
        let doc = Self::load(input).map_err(|e| PipelineError::extraction(input, e))?;
        let extraction = extract::extract_document(&doc, self.source);
        debug!("Found {} SVG text targets in {}", extraction.units.len(), input.display());
        Ok(extraction)
    }

    fn apply(&self, input: &Path, output: &Path, translations: &TranslationMap) -> Result<ApplyReport, PipelineError> {
        let mut doc = Self::load(input).map_err(|e| PipelineError::application(input, e))?;
        let report = apply::apply_translations(&mut doc, translations, self.source, self.target);

        FileManager::write_atomic(output, &doc.to_bytes())
            .map_err(|e| PipelineError::application(output, format!("{:#}", e)))?;
        Ok(report)
    }
}
