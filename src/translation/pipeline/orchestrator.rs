/*!
 * Pipeline orchestrator shared by every document format.
 *
 * One run goes through these stages:
 * 1. Extract text units from the input document
 * 2. Reuse cached translations whose original text is unchanged
 * 3. Translate only the remaining backlog, chunk by chunk
 * 4. Propagate translations to duplicate units and persist the cache
 * 5. Apply the translations to a fresh load of the document
 */

use std::path::Path;

use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::errors::{PipelineError, TranslationError};
use crate::translation::cache::{DocumentMetadata, MetadataCache};
use crate::translation::client::TranslationClient;
use crate::translation::dedup;
use crate::translation::document::{ApplyReport, StructuralReport, TextUnit, TranslationMap};

use super::progress::{MonotonicProgress, ProgressSink};

/// Units found in a document plus the sub-trees that could not be read
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub units: Vec<TextUnit>,
    pub report: StructuralReport,
}

/// A document format the pipeline can process.
///
/// `extract` and `apply` each open the document themselves, so the two passes
/// never share an in-memory object graph; ids must survive the reload.
pub trait DocumentFormat: Send + Sync {
    /// Short format name for logs
    fn name(&self) -> &'static str;

    /// Collect every translatable unit of the document
    fn extract(&self, input: &Path) -> Result<Extraction, PipelineError>;

    /// Rewrite a fresh load of `input` with the translations and write it to `output`
    fn apply(&self, input: &Path, output: &Path, translations: &TranslationMap) -> Result<ApplyReport, PipelineError>;
}

/// Counters of one pipeline run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Units extracted from the document
    pub extracted: usize,
    /// Units that reuse a representative's translation
    pub duplicates: usize,
    /// Units served from the metadata cache
    pub cache_hits: usize,
    /// Units sent to the translation service
    pub translated: usize,
    /// Requests issued to the translation service, retries included
    pub requests: usize,
    /// Nodes rewritten in the output
    pub applied: usize,
    /// Source-language nodes left without a translation
    pub missed: usize,
    /// Matched nodes skipped because they already hold a translation
    pub skipped_already_translated: usize,
    /// Sub-trees skipped during extraction and application
    pub structural_warnings: usize,
    /// Set when the metadata cache could not be saved
    pub persistence_error: Option<String>,
}

/// Generic extract → diff → translate → apply pipeline
pub struct Pipeline<F> {
    format: F,
    client: TranslationClient,
    cache: MetadataCache,
}

impl<F: DocumentFormat> Pipeline<F> {
    pub fn new(format: F, client: TranslationClient) -> Self {
        Self { format, client, cache: MetadataCache::new() }
    }

    pub fn format(&self) -> &F {
        &self.format
    }

    /// Extract units and mark the ones the cache already covers, without
    /// contacting the translation service
    pub fn preview(&self, input: &Path) -> Result<Vec<TextUnit>, PipelineError> {
        let Extraction { mut units, report } = self.format.extract(input)?;
        report.log(&display_name(input));

        let metadata = self.cache.load(input);
        dedup::consolidate(&mut units);
        for unit in units.iter_mut().filter(|u| !u.is_duplicate()) {
            unit.translated_text = metadata
                .lookup(&unit.id, &unit.original_text)
                .map(str::to_string);
        }
        dedup::propagate(&mut units);
        Ok(units)
    }

    /// Translate `input` into `output`
    pub async fn run(
        &self,
        input: &Path,
        output: &Path,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<RunSummary, PipelineError> {
        let progress = MonotonicProgress::new(progress);
        let name = display_name(input);
        let mut summary = RunSummary::default();

        // Extraction
        check_cancelled(cancel)?;
        progress.report("extracting", 5);
        let Extraction { mut units, report } = self.format.extract(input)?;
        report.log(&name);
        summary.extracted = units.len();
        summary.structural_warnings = report.len();

        if units.is_empty() {
            info!("No translatable text in {}, copying it unchanged", name);
            progress.report("no translatable text", 90);
            copy_unchanged(input, output)?;
            progress.report("complete", 100);
            return Ok(summary);
        }
        info!("Extracted {} {} text units from {}", units.len(), self.format.name(), name);

        // Cache lookup
        check_cancelled(cancel)?;
        progress.report("loading cache", 20);
        let metadata = self.cache.load(input);
        let fingerprint = self.cache
            .fingerprint(input)
            .map_err(|e| PipelineError::extraction(input, e))?;
        dedup::consolidate(&mut units);

        let mut backlog: Vec<usize> = Vec::new();
        for (index, unit) in units.iter_mut().enumerate() {
            if unit.is_duplicate() {
                continue;
            }
            match metadata.lookup(&unit.id, &unit.original_text) {
                Some(translated) => {
                    unit.translated_text = Some(translated.to_string());
                    summary.cache_hits += 1;
                }
                None => backlog.push(index),
            }
        }

        // Translation of the backlog
        check_cancelled(cancel)?;
        if backlog.is_empty() {
            info!("All {} texts of {} are cached", summary.cache_hits, name);
            progress.report("all texts cached", 80);
        } else {
            info!(
                "Translating {} texts of {} ({} cached)",
                backlog.len(),
                name,
                summary.cache_hits
            );
            let texts: Vec<String> = backlog.iter().map(|&i| units[i].original_text.clone()).collect();

            let result = self.client
                .translate_chunks(&texts, cancel, |chunk| {
                    for (position, translated) in chunk.translations.into_iter().enumerate() {
                        units[backlog[chunk.offset + position]].translated_text = Some(translated);
                    }
                    let done = chunk.index + 1;
                    let percent = 20 + (done * 60 / chunk.total) as u8;
                    progress.report(&format!("translating ({}/{})", done, chunk.total), percent);
                })
                .await;

            match result {
                Ok(stats) => {
                    summary.translated = backlog.len();
                    summary.requests = stats.requests;
                }
                Err(e) => {
                    self.keep_partial_results(input, &mut units, &fingerprint);
                    return Err(match e {
                        TranslationError::Cancelled => PipelineError::Cancelled,
                        other => PipelineError::Translation(other),
                    });
                }
            }
        }

        // Duplicates and cache
        progress.report("propagating duplicates", 85);
        summary.duplicates = dedup::propagate(&mut units);

        let metadata = DocumentMetadata::rebuild(&units, &fingerprint);
        if let Err(e) = self.cache.save(input, &metadata) {
            error!("{}", e);
            summary.persistence_error = Some(e.to_string());
        }

        // Application
        check_cancelled(cancel)?;
        progress.report("applying translations", 90);
        let translations = TranslationMap::from_units(&units);
        let report = self.format.apply(input, output, &translations)?;
        report.log(&name);

        summary.applied = report.applied;
        summary.missed = report.missed.len();
        summary.skipped_already_translated = report.already_translated;
        summary.structural_warnings += report.structural.len();

        progress.report("complete", 100);
        info!(
            "Finished {}: {} applied, {} cached, {} translated in {} requests",
            name, summary.applied, summary.cache_hits, summary.translated, summary.requests
        );
        Ok(summary)
    }

    /// Persist whatever was translated before a failure so a retry can reuse it
    fn keep_partial_results(&self, input: &Path, units: &mut [TextUnit], fingerprint: &str) {
        dedup::propagate(units);
        let partial = DocumentMetadata::rebuild(units, fingerprint);
        if partial.is_empty() {
            return;
        }
        match self.cache.save(input, &partial) {
            Ok(()) => warn!(
                "Translation of {} stopped early; kept {} translations for the next run",
                display_name(input),
                partial.len()
            ),
            Err(e) => error!("{}", e),
        }
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<(), PipelineError> {
    if cancel.is_cancelled() {
        Err(PipelineError::Cancelled)
    } else {
        Ok(())
    }
}

fn copy_unchanged(input: &Path, output: &Path) -> Result<(), PipelineError> {
    if input == output {
        return Ok(());
    }
    std::fs::copy(input, output)
        .map(|_| ())
        .map_err(|e| PipelineError::application(output, e))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
