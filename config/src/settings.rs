//! Typed view over the `TRELLIS_*` environment keys.
//!
//! Read after [`load_and_apply`](crate::load_and_apply) so all three config
//! sources have been folded into the environment.

/// Explorer runtime settings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExplorerSettings {
    /// Live generation endpoint (`TRELLIS_BACKEND_URL`).
    pub backend_url: Option<String>,
    /// Model name forwarded in requests (`TRELLIS_MODEL`).
    pub model: Option<String>,
    /// Sampling temperature (`TRELLIS_TEMPERATURE`); unparsable values are
    /// ignored.
    pub temperature: Option<f32>,
    /// Mock mode toggle (`TRELLIS_MOCK`): `1`, `true`, `yes`, `on`.
    pub mock: bool,
}

fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl ExplorerSettings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            backend_url: var("TRELLIS_BACKEND_URL"),
            model: var("TRELLIS_MODEL"),
            temperature: var("TRELLIS_TEMPERATURE").and_then(|v| v.trim().parse().ok()),
            mock: var("TRELLIS_MOCK").map(|v| truthy(&v)).unwrap_or(false),
        }
    }

    /// True when no backend URL is configured; the CLI falls back to mock
    /// mode rather than failing.
    pub fn effective_mock(&self) -> bool {
        self.mock || self.backend_url.is_none()
    }
}
