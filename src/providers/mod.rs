/*!
 * Translation service backends.
 *
 * This module contains client implementations for the external services
 * that turn texts of one language into another:
 * - DeepL: REST API integration
 * - Mock: deterministic offline backend for tests and dry runs
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use crate::app_config::{TranslationConfig, TranslationProvider};
use crate::errors::ProviderError;

/// Common trait for all translation services
///
/// Implementations translate a batch of texts in one request and keep the
/// order of the input. Rate-limit and overload conditions must be reported as
/// `ProviderError::RateLimitExceeded` / `ProviderError::Overloaded` so the
/// caller can tell them apart from permanent failures.
#[async_trait]
pub trait TranslationBackend: Send + Sync + Debug {
    /// Translate a batch of texts
    ///
    /// # Arguments
    /// * `texts` - Texts to translate, in order
    /// * `source_language` - ISO code of the input language
    /// * `target_language` - ISO code of the output language
    ///
    /// # Returns
    /// * `Result<Vec<String>, ProviderError>` - One translation per input text
    async fn translate(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError>;

    /// Human-readable backend name for logs
    fn name(&self) -> &str;
}

/// Build the backend selected in the configuration
pub fn create_backend(config: &TranslationConfig) -> Result<Arc<dyn TranslationBackend>, ProviderError> {
    match config.provider {
        TranslationProvider::DeepL => Ok(Arc::new(deepl::DeepL::from_config(config)?)),
        TranslationProvider::Mock => Ok(Arc::new(mock::MockBackend::working())),
    }
}

pub mod deepl;
pub mod mock;
