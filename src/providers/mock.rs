/*!
 * Mock backend implementations for testing.
 *
 * This module provides a backend that simulates different service behaviors:
 * - `MockBackend::working()` - Always succeeds with `[<target>] <text>`
 * - `MockBackend::rate_limited(n)` - Signals rate limiting n times, then succeeds
 * - `MockBackend::failing()` - Always fails with a permanent error
 * - `MockBackend::failing_after(n)` - Succeeds n times, then fails permanently
 *
 * Every request is recorded so tests can assert on call counts and batches.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::errors::ProviderError;

use super::TranslationBackend;

/// Behavior mode for the mock backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Answers the first `failures` requests with a rate-limit error
    RateLimited { failures: usize },
    /// Answers the first `failures` requests with an overload error
    Overloaded { failures: usize },
    /// Always fails with a non-retryable error
    Failing,
    /// Succeeds `successes` times, then fails with a non-retryable error
    FailingAfter { successes: usize },
    /// Returns one translation fewer than requested
    Short,
}

/// Mock backend for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockBackend {
    /// Behavior mode
    behavior: MockBehavior,
    /// Every batch received, shared between clones
    requests: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockBackend {
    /// Create a new mock backend with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a working mock backend that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a backend that is rate limited for the first `failures` requests
    pub fn rate_limited(failures: usize) -> Self {
        Self::new(MockBehavior::RateLimited { failures })
    }

    /// Create a backend that is overloaded for the first `failures` requests
    pub fn overloaded(failures: usize) -> Self {
        Self::new(MockBehavior::Overloaded { failures })
    }

    /// Create a failing mock backend that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a backend that breaks after `successes` good requests
    pub fn failing_after(successes: usize) -> Self {
        Self::new(MockBehavior::FailingAfter { successes })
    }

    /// The translation this backend produces for a text
    pub fn expected_translation(text: &str, target_language: &str) -> String {
        format!("[{}] {}", target_language, text)
    }

    /// Number of requests received so far (including failed ones)
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Every batch received so far
    pub fn requests(&self) -> Vec<Vec<String>> {
        self.requests.lock().clone()
    }

    /// Every text received so far, flattened
    pub fn requested_texts(&self) -> Vec<String> {
        self.requests.lock().iter().flatten().cloned().collect()
    }
}

#[async_trait]
impl TranslationBackend for MockBackend {
    async fn translate(
        &self,
        texts: &[String],
        _source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let count = {
            let mut requests = self.requests.lock();
            requests.push(texts.to_vec());
            requests.len() - 1
        };

        let translated = || {
            texts
                .iter()
                .map(|text| Self::expected_translation(text, target_language))
                .collect::<Vec<_>>()
        };

        match self.behavior {
            MockBehavior::Working => Ok(translated()),

            MockBehavior::RateLimited { failures } if count < failures => Err(
                ProviderError::RateLimitExceeded(format!("Too many requests (request #{})", count + 1)),
            ),
            MockBehavior::RateLimited { .. } => Ok(translated()),

            MockBehavior::Overloaded { failures } if count < failures => Err(
                ProviderError::Overloaded(format!("Service under high load (request #{})", count + 1)),
            ),
            MockBehavior::Overloaded { .. } => Ok(translated()),

            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 400,
                message: "Simulated permanent failure".to_string(),
            }),

            MockBehavior::FailingAfter { successes } if count >= successes => {
                Err(ProviderError::ApiError {
                    status_code: 500,
                    message: format!("Simulated failure on request #{}", count + 1),
                })
            }
            MockBehavior::FailingAfter { .. } => Ok(translated()),

            MockBehavior::Short => {
                let mut out = translated();
                out.pop();
                Ok(out)
            }
        }
    }

    fn name(&self) -> &str {
        "Mock"
    }
}
