/*!
 * Mock translator for testing.
 *
 * This module provides an in-process `Translator` that simulates the ways
 * a real translator behaves and misbehaves:
 * - `MockTranslator::working()` - Upper-cases the text, keeping separators intact
 * - `MockTranslator::strip_separators()` - Loses every batch separator
 * - `MockTranslator::corrupt_primary()` - Loses only the primary separator
 * - `MockTranslator::failing()` - Always fails with an error
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

use crate::errors::ProviderError;
use crate::providers::Translator;
use crate::translation::batch::{PRIMARY_SEPARATOR, SECONDARY_SEPARATOR};

/// A translate call as seen by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct MockRequest {
    /// The text to translate
    pub text: String,
    /// Source language
    pub source_language: String,
    /// Target language
    pub target_language: String,
}

/// Behavior mode for the mock translator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds, upper-casing the text
    Working,
    /// Succeeds but drops every separator token
    StripSeparators,
    /// Succeeds but drops only the primary separator
    CorruptPrimary,
    /// Fails every Nth request
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Simulates a slow translator that honours cancellation
    Slow { delay_ms: u64 },
}

type ResponseGenerator = fn(&MockRequest) -> Result<String, ProviderError>;

/// Mock translator for testing pipeline behavior
#[derive(Debug, Clone)]
pub struct MockTranslator {
    /// Behavior mode
    behavior: MockBehavior,
    /// Every request received, in order
    requests: Arc<Mutex<Vec<MockRequest>>>,
    /// Request counter for intermittent failures
    request_count: Arc<AtomicUsize>,
    /// Number of start_server calls
    server_starts: Arc<AtomicUsize>,
    /// Number of stop_server calls
    server_stops: Arc<AtomicUsize>,
    /// Whether start_server should fail
    fail_server_start: Arc<AtomicBool>,
    /// Custom response generator (optional)
    custom_response: Option<ResponseGenerator>,
}

impl MockTranslator {
    /// Create a new mock translator with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            requests: Arc::new(Mutex::new(Vec::new())),
            request_count: Arc::new(AtomicUsize::new(0)),
            server_starts: Arc::new(AtomicUsize::new(0)),
            server_stops: Arc::new(AtomicUsize::new(0)),
            fail_server_start: Arc::new(AtomicBool::new(false)),
            custom_response: None,
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn strip_separators() -> Self {
        Self::new(MockBehavior::StripSeparators)
    }

    pub fn corrupt_primary() -> Self {
        Self::new(MockBehavior::CorruptPrimary)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Replace the behavior with a custom response generator
    pub fn with_custom_response(mut self, generator: ResponseGenerator) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Make start_server fail
    pub fn with_failing_server(self) -> Self {
        self.fail_server_start.store(true, Ordering::SeqCst);
        self
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().clone()
    }

    /// Number of translate calls received
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    pub fn server_starts(&self) -> usize {
        self.server_starts.load(Ordering::SeqCst)
    }

    pub fn server_stops(&self) -> usize {
        self.server_stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        from: &str,
        to: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError> {
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        let request = MockRequest {
            text: text.to_string(),
            source_language: from.to_string(),
            target_language: to.to_string(),
        };
        self.requests.lock().push(request.clone());
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);

        if text.trim().is_empty() {
            return Err(ProviderError::InvalidInput("text to translate is empty".to_string()));
        }

        if let Some(generator) = self.custom_response {
            return generator(&request);
        }

        match self.behavior {
            MockBehavior::Working => Ok(text.to_uppercase()),

            MockBehavior::StripSeparators => Ok(text
                .replace(SECONDARY_SEPARATOR, " ")
                .replace(PRIMARY_SEPARATOR, " ")
                .to_uppercase()),

            MockBehavior::CorruptPrimary => Ok(text.replace(PRIMARY_SEPARATOR, " ").to_uppercase()),

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ExecutionFailed {
                        program: "mock".to_string(),
                        status: "exit status: 1".to_string(),
                        stderr: format!("Simulated intermittent failure (request #{})", count + 1),
                    })
                } else {
                    Ok(text.to_uppercase())
                }
            }

            MockBehavior::Failing => Err(ProviderError::ExecutionFailed {
                program: "mock".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "Simulated translator failure".to_string(),
            }),

            MockBehavior::Slow { delay_ms } => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(ProviderError::Cancelled),
                    _ = tokio::time::sleep(std::time::Duration::from_millis(delay_ms)) => Ok(text.to_uppercase()),
                }
            }
        }
    }

    async fn start_server(&self, cancel: &CancellationToken) -> Result<(), ProviderError> {
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }
        self.server_starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_server_start.load(Ordering::SeqCst) {
            return Err(ProviderError::ServerUnavailable("simulated start failure".to_string()));
        }
        Ok(())
    }

    fn stop_server(&self) -> Result<(), ProviderError> {
        self.server_stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
