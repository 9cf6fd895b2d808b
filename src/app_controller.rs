use anyhow::{anyhow, Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::app_config::Config;
use crate::diagram::DiagramFormat;
use crate::file_utils::{DocumentType, FileManager};
use crate::language_utils::Script;
use crate::providers::{self, TranslationBackend};
use crate::svg::SvgFormat;
use crate::translation::pipeline::{DocumentFormat, Pipeline, ProgressSink, RunSummary};
use crate::translation::{ClientSettings, TextUnit, TranslationClient};

// @module: Application controller for document translation

/// Dry-run view of one document
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPreview {
    pub path: PathBuf,
    /// Units with a reusable cached translation
    pub cached: usize,
    /// Units that would be sent to the translation service
    pub pending: usize,
    pub units: Vec<TextUnit>,
}

/// Outcome of one processed document
#[derive(Debug, Clone)]
pub struct DocumentOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub summary: RunSummary,
}

/// Totals of a folder run
#[derive(Debug, Default, Clone)]
pub struct BatchSummary {
    pub processed: Vec<DocumentOutcome>,
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn requests(&self) -> usize {
        self.processed.iter().map(|o| o.summary.requests).sum()
    }
}

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Shared translation service backend
    backend: Arc<dyn TranslationBackend>,
    source: Script,
    target: Script,
    // @field: Hide progress bars (tests, piped output)
    quiet: bool,
}

impl Controller {
    // @method: Create a new controller with the backend named in the configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let backend = providers::create_backend(&config.translation)
            .context("Failed to create translation backend")?;
        Self::with_backend(config, backend)
    }

    // @method: Create a controller around an existing backend
    pub fn with_backend(config: Config, backend: Arc<dyn TranslationBackend>) -> Result<Self> {
        let source = config.source_script()?;
        let target = config.target_script()?;
        Ok(Self { config, backend, source, target, quiet: false })
    }

    /// Disable progress bars
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn client(&self) -> TranslationClient {
        TranslationClient::new(self.backend.clone(), ClientSettings::from_config(&self.config))
    }

    fn multi_progress(&self) -> MultiProgress {
        let multi = MultiProgress::new();
        if self.quiet {
            multi.set_draw_target(indicatif::ProgressDrawTarget::hidden());
        }
        multi
    }

    /// Translate one document.
    ///
    /// Without an explicit `output` the result lands next to the input with the
    /// configured suffix; an existing output is only overwritten with `force`.
    pub async fn run(
        &self,
        input: PathBuf,
        output: Option<PathBuf>,
        force: bool,
        cancel: &CancellationToken,
    ) -> Result<DocumentOutcome> {
        if !FileManager::file_exists(&input) {
            return Err(anyhow!("Input file does not exist: {:?}", input));
        }
        let output = match output {
            Some(path) => FileManager::generate_output_path(path, "", force),
            None => FileManager::generate_output_path(&input, &self.config.batch.output_suffix, force),
        };

        let multi = self.multi_progress();
        let bar = multi.add(Self::file_progress_bar(&input));
        let result = self.run_document(&input, &output, &bar, cancel).await;
        bar.finish_and_clear();

        let summary = result?;
        Self::log_summary(&input, &output, &summary);
        Ok(DocumentOutcome { input, output, summary })
    }

    /// Translate every supported document below `input_dir`.
    ///
    /// Documents run concurrently up to `batch.concurrent_files`; a failing
    /// document is logged and counted without stopping the others.
    pub async fn run_folder(
        &self,
        input_dir: PathBuf,
        output_dir: Option<PathBuf>,
        force: bool,
        cancel: &CancellationToken,
    ) -> Result<BatchSummary> {
        let start_time = Instant::now();
        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let documents = FileManager::find_documents(&input_dir, &self.config.batch.output_suffix)?;
        if documents.is_empty() {
            warn!("No SVG or diagram documents found in {:?}", input_dir);
            return Ok(BatchSummary::default());
        }
        info!("Found {} documents in {:?}", documents.len(), input_dir);

        let multi = self.multi_progress();
        let folder_pb = multi.add(ProgressBar::new(documents.len() as u64));
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(style.progress_chars("█▓▒░"));
        folder_pb.set_message("Processing files");

        let mut jobs = Vec::with_capacity(documents.len());
        for input in documents {
            let output = match &output_dir {
                Some(dir) => {
                    let relative = input.strip_prefix(&input_dir).unwrap_or(input.as_path());
                    let target = dir.join(relative);
                    if let Some(parent) = target.parent() {
                        FileManager::ensure_dir(parent)?;
                    }
                    FileManager::generate_output_path(target, "", force)
                }
                None => FileManager::generate_output_path(&input, &self.config.batch.output_suffix, force),
            };
            jobs.push((input, output));
        }

        let results: Vec<(PathBuf, PathBuf, Result<RunSummary>)> = stream::iter(jobs)
            .map(|(input, output)| {
                let multi = &multi;
                let folder_pb = &folder_pb;
                async move {
                    let bar = multi.add(Self::file_progress_bar(&input));
                    let result = self.run_document(&input, &output, &bar, cancel).await;
                    bar.finish_and_clear();
                    folder_pb.inc(1);
                    (input, output, result)
                }
            })
            .buffer_unordered(self.config.batch.concurrent_files.max(1))
            .collect()
            .await;
        folder_pb.finish_with_message("Folder processing complete");

        let mut batch = BatchSummary::default();
        for (input, output, result) in results {
            match result {
                Ok(summary) => {
                    Self::log_summary(&input, &output, &summary);
                    batch.processed.push(DocumentOutcome { input, output, summary });
                }
                Err(e) => {
                    error!("Error processing file {}: {:#}", input.display(), e);
                    batch.failed.push((input, format!("{:#}", e)));
                }
            }
        }
        batch.processed.sort_by(|a, b| a.input.cmp(&b.input));
        batch.failed.sort();

        info!(
            "Folder processing completed: {} processed, {} errors, {} requests in {}",
            batch.processed.len(),
            batch.failed.len(),
            batch.requests(),
            Self::format_duration(start_time.elapsed())
        );
        Ok(batch)
    }

    /// Extract a file or every document of a folder without calling the
    /// translation service
    pub fn extract(&self, input: &Path) -> Result<Vec<DocumentPreview>> {
        let documents = if input.is_dir() {
            FileManager::find_documents(input, &self.config.batch.output_suffix)?
        } else if input.is_file() {
            vec![input.to_path_buf()]
        } else {
            return Err(anyhow!("Input path does not exist: {:?}", input));
        };

        documents
            .into_iter()
            .map(|path| {
                let units = match FileManager::detect_document_type(&path) {
                    DocumentType::Svg => self.pipeline(SvgFormat::new(self.source, self.target)).preview(&path),
                    DocumentType::DiagramModel => {
                        self.pipeline(DiagramFormat::new(self.source, self.target)).preview(&path)
                    }
                    DocumentType::Unsupported => return Err(Self::unsupported(&path)),
                }?;
                let cached = units.iter().filter(|u| u.translated_text.is_some()).count();
                let pending = units.iter().filter(|u| u.translated_text.is_none() && !u.is_duplicate()).count();
                Ok(DocumentPreview { path, cached, pending, units })
            })
            .collect()
    }

    fn pipeline<F: DocumentFormat>(&self, format: F) -> Pipeline<F> {
        Pipeline::new(format, self.client())
    }

    async fn run_document(
        &self,
        input: &Path,
        output: &Path,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<RunSummary> {
        let summary = match FileManager::detect_document_type(input) {
            DocumentType::Svg => {
                self.pipeline(SvgFormat::new(self.source, self.target))
                    .run(input, output, progress, cancel)
                    .await
            }
            DocumentType::DiagramModel => {
                self.pipeline(DiagramFormat::new(self.source, self.target))
                    .run(input, output, progress, cancel)
                    .await
            }
            DocumentType::Unsupported => return Err(Self::unsupported(input)),
        }
        .with_context(|| format!("Failed to translate {}", input.display()))?;
        Ok(summary)
    }

    fn unsupported(path: &Path) -> anyhow::Error {
        anyhow!("Unsupported document type (expected .svg or .uml.json): {:?}", path)
    }

    fn file_progress_bar(input: &Path) -> ProgressBar {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::default_bar()
            .template("{prefix:.bold} [{bar:30.green/white}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style.progress_chars("█▓▒░"));
        bar.set_prefix(
            input
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
        );
        bar
    }

    fn log_summary(input: &Path, output: &Path, summary: &RunSummary) {
        info!(
            "{} -> {}: {} units, {} cached, {} translated in {} requests, {} applied",
            input.display(),
            output.display(),
            summary.extracted,
            summary.cache_hits,
            summary.translated,
            summary.requests,
            summary.applied
        );
        if let Some(reason) = &summary.persistence_error {
            warn!("Translation cache for {} was not saved: {}", input.display(), reason);
        }
    }

    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;

        if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
