/*!
 * Chunked, retrying adapter to a translation backend.
 *
 * Texts are sent in fixed-size chunks with a short pause between them. A chunk
 * that hits a rate-limit or overload signal is retried with linearly growing
 * backoff; any other error ends the call. Cancellation is honoured before
 * every chunk and every attempt, and interrupts the pauses.
 */

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::app_config::Config;
use crate::errors::{ProviderError, TranslationError};
use crate::providers::TranslationBackend;

/// Retry budget for one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    /// Backoff after the first failure; the n-th failure waits n times this
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_backoff: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), base_backoff }
    }

    /// Fresh state for one chunk
    pub fn start(&self) -> RetryState {
        RetryState { policy: *self, attempts: 0 }
    }
}

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait, then try again
    RetryAfter(Duration),
    /// Transient failure, but the budget is spent
    Exhausted,
    /// Permanent failure, do not retry
    Fatal,
}

/// Attempt counter for one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    policy: RetryPolicy,
    attempts: u32,
}

impl RetryState {
    /// Attempts started so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Mark the start of an attempt
    pub fn begin_attempt(&mut self) {
        self.attempts += 1;
    }

    /// Decide how to continue after the current attempt failed
    pub fn on_failure(&self, error: &ProviderError) -> RetryDecision {
        if !error.is_retryable() {
            RetryDecision::Fatal
        } else if self.attempts >= self.policy.max_attempts {
            RetryDecision::Exhausted
        } else {
            RetryDecision::RetryAfter(self.policy.base_backoff * self.attempts)
        }
    }
}

/// Settings of the translation client
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub source_language: String,
    pub target_language: String,
    /// Texts per request
    pub chunk_size: usize,
    /// Pause between consecutive requests
    pub chunk_delay: Duration,
    pub retry: RetryPolicy,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            source_language: "ja".to_string(),
            target_language: "ko".to_string(),
            chunk_size: 50,
            chunk_delay: Duration::from_millis(500),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientSettings {
    /// Derive client settings from the application configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            source_language: config.source_language.clone(),
            target_language: config.target_language.clone(),
            chunk_size: config.translation.chunk_size.max(1),
            chunk_delay: config.translation.chunk_delay(),
            retry: RetryPolicy::new(config.translation.retry_count, config.translation.retry_backoff()),
        }
    }
}

/// Result of one successfully translated chunk
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedChunk {
    /// Zero-based chunk number
    pub index: usize,
    /// Number of chunks in the call
    pub total: usize,
    /// Position of the chunk's first text in the input
    pub offset: usize,
    /// Translations, same length and order as the chunk
    pub translations: Vec<String>,
}

/// Counters of one chunked call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientStats {
    /// Chunks completed
    pub chunks: usize,
    /// Backend requests issued, retries included
    pub requests: usize,
}

/// Chunked, rate-aware, retrying translation client
#[derive(Debug, Clone)]
pub struct TranslationClient {
    backend: Arc<dyn TranslationBackend>,
    settings: ClientSettings,
}

impl TranslationClient {
    pub fn new(backend: Arc<dyn TranslationBackend>, settings: ClientSettings) -> Self {
        Self { backend, settings }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Number of requests a backlog of `count` texts needs, retries excluded
    pub fn chunk_count(&self, count: usize) -> usize {
        count.div_ceil(self.settings.chunk_size.max(1))
    }

    /// Translate texts, preserving order and length
    pub async fn translate(
        &self,
        texts: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, TranslationError> {
        let mut results = Vec::with_capacity(texts.len());
        self.translate_chunks(texts, cancel, |chunk| results.extend(chunk.translations))
            .await?;
        Ok(results)
    }

    /// Translate texts chunk by chunk, handing each chunk's results to `on_chunk`
    /// as soon as they arrive.
    ///
    /// Chunks completed before an error have already been delivered.
    pub async fn translate_chunks<F>(
        &self,
        texts: &[String],
        cancel: &CancellationToken,
        mut on_chunk: F,
    ) -> Result<ClientStats, TranslationError>
    where
        F: FnMut(TranslatedChunk),
    {
        let chunk_size = self.settings.chunk_size.max(1);
        let total = self.chunk_count(texts.len());
        let mut stats = ClientStats::default();

        for (index, chunk) in texts.chunks(chunk_size).enumerate() {
            if index > 0 {
                pause(self.settings.chunk_delay, cancel).await?;
            }
            if cancel.is_cancelled() {
                return Err(TranslationError::Cancelled);
            }

            debug!("Translating chunk {}/{} ({} texts)", index + 1, total, chunk.len());
            let (translations, attempts) = self.translate_chunk(chunk, cancel).await?;
            stats.requests += attempts as usize;
            stats.chunks += 1;

            on_chunk(TranslatedChunk {
                index,
                total,
                offset: index * chunk_size,
                translations,
            });
        }

        if total > 0 {
            info!(
                "Translated {} texts in {} chunks via {} ({} requests)",
                texts.len(),
                stats.chunks,
                self.backend.name(),
                stats.requests
            );
        }
        Ok(stats)
    }

    /// Translate a single chunk under the retry policy.
    ///
    /// Returns the translations and the number of attempts used.
    pub async fn translate_chunk(
        &self,
        chunk: &[String],
        cancel: &CancellationToken,
    ) -> Result<(Vec<String>, u32), TranslationError> {
        let mut state = self.settings.retry.start();

        loop {
            if cancel.is_cancelled() {
                return Err(TranslationError::Cancelled);
            }

            state.begin_attempt();
            let result = self.backend
                .translate(chunk, &self.settings.source_language, &self.settings.target_language)
                .await;

            let error = match result {
                Ok(translations) if translations.len() == chunk.len() => {
                    return Ok((translations, state.attempts()));
                }
                Ok(translations) => {
                    return Err(TranslationError::ResponseMismatch {
                        expected: chunk.len(),
                        actual: translations.len(),
                    });
                }
                Err(error) => error,
            };

            match state.on_failure(&error) {
                RetryDecision::RetryAfter(backoff) => {
                    warn!(
                        "{} (attempt {}/{}), retrying in {:?}",
                        error,
                        state.attempts(),
                        self.settings.retry.max_attempts,
                        backoff
                    );
                    pause(backoff, cancel).await?;
                }
                RetryDecision::Exhausted => {
                    return Err(TranslationError::RetriesExhausted {
                        attempts: state.attempts(),
                        last: error,
                    });
                }
                RetryDecision::Fatal => return Err(TranslationError::Provider(error)),
            }
        }
    }
}

/// Sleep unless the token fires first
async fn pause(duration: Duration, cancel: &CancellationToken) -> Result<(), TranslationError> {
    if cancel.is_cancelled() {
        return Err(TranslationError::Cancelled);
    }
    if duration.is_zero() {
        return Ok(());
    }

    tokio::select! {
        _ = cancel.cancelled() => Err(TranslationError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}
