/*!
 * Tests for error types and conversions
 */

use std::path::Path;

use jatoko::errors::{AppError, PipelineError, ProviderError, StructuralAccessWarning, TranslationError};

#[test]
fn test_providerError_apiError_shouldDisplayStatusAndMessage() {
    let error = ProviderError::ApiError {
        status_code: 456,
        message: "Quota exceeded".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("456"));
    assert!(display.contains("Quota exceeded"));
}

#[test]
fn test_providerError_isRetryable_shouldOnlyAcceptTransientSignals() {
    assert!(ProviderError::RateLimitExceeded("slow down".into()).is_retryable());
    assert!(ProviderError::Overloaded("busy".into()).is_retryable());
    assert!(ProviderError::ApiError { status_code: 429, message: String::new() }.is_retryable());
    assert!(ProviderError::RequestFailed("Too Many Requests".into()).is_retryable());

    assert!(!ProviderError::AuthenticationError("bad key".into()).is_retryable());
    assert!(!ProviderError::ApiError { status_code: 456, message: "quota".into() }.is_retryable());
    assert!(!ProviderError::ParseError("eof".into()).is_retryable());
}

#[test]
fn test_translationError_retriesExhausted_shouldNameLastError() {
    let error = TranslationError::RetriesExhausted {
        attempts: 3,
        last: ProviderError::Overloaded("high load".into()),
    };
    let display = error.to_string();
    assert!(display.contains("3 attempts"));
    assert!(display.contains("high load"));
}

#[test]
fn test_pipelineError_constructors_shouldCarryPath() {
    let error = PipelineError::persistence(Path::new("/tmp/a.svg.meta.json"), "disk full");
    assert_eq!(error.to_string(), "Failed to persist metadata for /tmp/a.svg.meta.json: disk full");

    let error = PipelineError::extraction(Path::new("model.uml.json"), "bad json");
    assert!(matches!(error, PipelineError::Extraction { .. }));
}

#[test]
fn test_pipelineError_fromTranslationError_shouldWrap() {
    let error: PipelineError = TranslationError::Cancelled.into();
    assert!(matches!(error, PipelineError::Translation(TranslationError::Cancelled)));
}

#[test]
fn test_appError_fromIoError_shouldBecomeFileError() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let error: AppError = io.into();
    assert!(matches!(error, AppError::File(_)));
}

#[test]
fn test_structuralWarning_display_shouldNameLocation() {
    let warning = StructuralAccessWarning::new("diagram d1", "subject x does not exist");
    assert!(warning.to_string().contains("diagram d1"));
    assert!(warning.to_string().contains("subject x does not exist"));
}
