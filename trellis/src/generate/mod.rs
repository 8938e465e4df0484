//! Generation client abstraction: shape a request for a purpose, dispatch it
//! to a text-generation backend, and normalize the result to plain text.
//!
//! The store depends on a callable that returns `{text}` for a
//! [`GenerationRequest`]; this module defines the [`TextGenerator`] trait
//! with a mock implementation ([`MockGenerator`], deterministic canned
//! tagged responses) and a live HTTP implementation ([`HttpGenerator`]).
//! Both emit the same tag vocabulary, so the parser is exercised
//! identically in mock and live mode.
//!
//! A generator result is classified into a tri-state
//! [`GenerationOutcome`] (`Text` / `Empty` / `Failed`); orchestration
//! decides via [`FallbackPolicy`] whether a degenerate outcome substitutes
//! the purpose-appropriate canned text or surfaces an error.

mod canned;
mod http;
mod mock;

pub use canned::canned_response;
pub use http::HttpGenerator;
pub use mock::MockGenerator;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Discrete request category; selects the system instruction and prompt
/// template, and the canned response used in mock/fallback paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Purpose {
    /// First expansion of a freshly named root.
    Init,
    /// Generic branch expansion.
    Expand,
    /// Reprocess the root after the user answers a clarifying question.
    Clarify,
    /// Expand a chosen step/pre node from the user's free-text input.
    AnswerPath,
}

impl Purpose {
    /// Wire name used in backend requests and config keys.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Purpose::Init => "init",
            Purpose::Expand => "expand",
            Purpose::Clarify => "clarify",
            Purpose::AnswerPath => "answerPath",
        }
    }
}

impl std::str::FromStr for Purpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "init" => Ok(Purpose::Init),
            "expand" => Ok(Purpose::Expand),
            "clarify" => Ok(Purpose::Clarify),
            "answerPath" => Ok(Purpose::AnswerPath),
            _ => Err(format!(
                "unknown purpose: {} (use init, expand, clarify, or answerPath)",
                s
            )),
        }
    }
}

/// One chat message in a backend request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request shape of the generation backend interface.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub messages: Vec<ChatMessage>,
    pub prompt_type: Purpose,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Normalized backend result: always text, possibly empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
}

/// Transport-level generation failure. "Backend returned nothing" is not an
/// error; empty text normalizes to an empty [`Generation`].
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Network or protocol failure reaching the backend.
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Backend answered with a non-success status.
    #[error("backend returned status {0}")]
    Status(reqwest::StatusCode),
}

/// Tri-state classification of one generation attempt, surfaced to the
/// store instead of silently substituting fallback text at the client.
#[derive(Debug)]
pub enum GenerationOutcome {
    /// Non-empty model text.
    Text(String),
    /// Backend reachable but returned empty or whitespace-only text.
    Empty,
    /// Transport failure.
    Failed(GenerationError),
}

impl GenerationOutcome {
    /// Classifies a generator result.
    pub fn from_result(result: Result<Generation, GenerationError>) -> Self {
        match result {
            Ok(g) if g.text.trim().is_empty() => GenerationOutcome::Empty,
            Ok(g) => GenerationOutcome::Text(g.text),
            Err(e) => GenerationOutcome::Failed(e),
        }
    }
}

/// What the store does with an `Empty` or `Failed` outcome.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Substitute the purpose-appropriate canned tagged response; the caller
    /// never sees a hard model error.
    #[default]
    CannedText,
    /// Propagate `Failed` as an error; treat `Empty` as a no-op expansion.
    Surface,
}

/// Text-generation backend: given a shaped request, returns `{text}`.
///
/// Implementations: [`MockGenerator`] (fixed canned responses),
/// [`HttpGenerator`] (live JSON POST). Errors only for transport-level
/// failures in live mode.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Purpose round-trips through its wire names, including
    /// the camel-cased answerPath.
    #[test]
    fn purpose_wire_names() {
        for p in [
            Purpose::Init,
            Purpose::Expand,
            Purpose::Clarify,
            Purpose::AnswerPath,
        ] {
            assert_eq!(p.wire_name().parse::<Purpose>().unwrap(), p);
        }
        assert!("bogus".parse::<Purpose>().is_err());
    }

    /// **Scenario**: Request JSON uses the backend field names; empty
    /// optionals are omitted.
    #[test]
    fn request_serializes_to_wire_shape() {
        let req = GenerationRequest {
            prompt: None,
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("hi")],
            prompt_type: Purpose::AnswerPath,
            model: Some("small".to_string()),
            temperature: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["promptType"], "answerPath");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["model"], "small");
        assert!(json.get("prompt").is_none());
        assert!(json.get("temperature").is_none());
    }

    /// **Scenario**: Outcome classification: text, whitespace-only, error.
    #[test]
    fn outcome_classification() {
        let text = GenerationOutcome::from_result(Ok(Generation {
            text: "<step>x</step>".to_string(),
        }));
        assert!(matches!(text, GenerationOutcome::Text(t) if t.contains("<step>")));

        let empty = GenerationOutcome::from_result(Ok(Generation {
            text: "  \n ".to_string(),
        }));
        assert!(matches!(empty, GenerationOutcome::Empty));
    }
}
