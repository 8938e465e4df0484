//! Mock generator for tests and offline development.
//!
//! Returns the per-purpose canned tagged response by default; configurable
//! fixed text for parser-focused tests. Records the call count and the last
//! purpose so orchestration tests can assert which requests were issued.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{canned_response, Generation, GenerationError, GenerationRequest, Purpose, TextGenerator};

/// Mock generator: canned or fixed tagged responses, no I/O.
///
/// **Interaction**: Implements [`TextGenerator`]; used by `SessionStore` in
/// mock mode and throughout orchestration tests.
pub struct MockGenerator {
    fixed: Option<String>,
    calls: AtomicUsize,
    last_purpose: Mutex<Option<Purpose>>,
}

impl MockGenerator {
    /// Mock that answers every request with the canned response for the
    /// request's purpose.
    pub fn new() -> Self {
        Self {
            fixed: None,
            calls: AtomicUsize::new(0),
            last_purpose: Mutex::new(None),
        }
    }

    /// Mock that answers every request with the given text, regardless of
    /// purpose.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            fixed: Some(text.into()),
            calls: AtomicUsize::new(0),
            last_purpose: Mutex::new(None),
        }
    }

    /// Mock that returns empty text (degenerate-output path).
    pub fn with_empty_text() -> Self {
        Self::with_text("")
    }

    /// Number of generate calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Purpose of the most recent call, if any.
    pub fn last_purpose(&self) -> Option<Purpose> {
        *self.last_purpose.lock().unwrap()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_purpose.lock().unwrap() = Some(request.prompt_type);
        let text = match &self.fixed {
            Some(t) => t.clone(),
            None => canned_response(request.prompt_type).to_string(),
        };
        Ok(Generation { text })
    }
}
