/*!
 * Error types for the jatoko application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur when working with translation service APIs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// The service is temporarily overloaded
    #[error("Service overloaded: {0}")]
    Overloaded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether the error signals a transient condition worth retrying.
    ///
    /// Only rate-limit and overload signals qualify. Some services report
    /// these as plain error messages, so the message text is checked as well.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimitExceeded(_) | Self::Overloaded(_) => true,
            Self::ApiError { status_code, message } => {
                matches!(status_code, 429 | 503 | 529) || is_transient_message(message)
            }
            Self::RequestFailed(message) => is_transient_message(message),
            _ => false,
        }
    }
}

fn is_transient_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("too many requests") || lower.contains("high load") || lower.contains("429")
}

/// Errors that can occur during translation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Transient failures persisted past the retry budget
    #[error("Translation failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// The last error seen
        last: ProviderError,
    },

    /// The service returned a different number of results than requested
    #[error("Expected {expected} translations but received {actual}")]
    ResponseMismatch {
        /// Number of texts sent
        expected: usize,
        /// Number of texts received
        actual: usize,
    },

    /// The caller cancelled the translation
    #[error("Translation cancelled")]
    Cancelled,
}

/// Errors that abort (or are surfaced by) a single pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The document could not be opened or parsed
    #[error("Failed to extract text from {path}: {message}")]
    Extraction {
        /// Source document
        path: PathBuf,
        /// Underlying cause
        message: String,
    },

    /// The translation service failed for good
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Rewriting the document failed after translations were obtained
    #[error("Failed to apply translations to {path}: {message}")]
    Application {
        /// Output document
        path: PathBuf,
        /// Underlying cause
        message: String,
    },

    /// The metadata cache could not be written
    #[error("Failed to persist metadata for {path}: {message}")]
    Persistence {
        /// Metadata file
        path: PathBuf,
        /// Underlying cause
        message: String,
    },

    /// The run was cancelled before it finished
    #[error("Pipeline cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Build an extraction error for a document
    pub fn extraction(path: &Path, message: impl fmt::Display) -> Self {
        Self::Extraction { path: path.to_path_buf(), message: message.to_string() }
    }

    /// Build an application error for a document
    pub fn application(path: &Path, message: impl fmt::Display) -> Self {
        Self::Application { path: path.to_path_buf(), message: message.to_string() }
    }

    /// Build a persistence error for a metadata file
    pub fn persistence(path: &Path, message: impl fmt::Display) -> Self {
        Self::Persistence { path: path.to_path_buf(), message: message.to_string() }
    }
}

/// A sub-tree of a document that could not be traversed.
///
/// Never returned as an error: traversal logs it and continues elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralAccessWarning {
    /// Where in the document the problem was found
    pub location: String,
    /// What went wrong
    pub reason: String,
}

impl StructuralAccessWarning {
    pub fn new(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { location: location.into(), reason: reason.into() }
    }
}

impl fmt::Display for StructuralAccessWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.reason)
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from a pipeline run
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
