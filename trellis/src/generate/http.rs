//! Live generation backend over HTTP.
//!
//! POSTs the JSON [`GenerationRequest`] to a configured endpoint and reads
//! `{ "text": ... }` back. A missing or null `text` normalizes to the empty
//! string: "backend returned nothing" is a degenerate response for the
//! parser, not an error. Only transport failures and non-success statuses
//! reject.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{Generation, GenerationError, GenerationRequest, TextGenerator};

/// HTTP generation client.
///
/// **Interaction**: Implements [`TextGenerator`]; constructed by the CLI
/// from `TRELLIS_BACKEND_URL` when mock mode is off.
pub struct HttpGenerator {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    text: Option<String>,
}

impl HttpGenerator {
    /// Client for the given endpoint with default reqwest settings.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Client with a caller-built `reqwest::Client` (custom timeout, proxy).
    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for HttpGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, GenerationError> {
        debug!(
            purpose = request.prompt_type.wire_name(),
            endpoint = %self.endpoint,
            "dispatching generation request"
        );
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Status(status));
        }
        let wire: WireResponse = response.json().await?;
        let text = wire.text.unwrap_or_default();
        debug!(chars = text.len(), "generation response received");
        Ok(Generation { text })
    }
}
