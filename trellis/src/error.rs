//! Store-level error types.
//!
//! Used by `SessionStore` operations. Generation transport failures are
//! wrapped; parser and layout stages never fail.

use thiserror::Error;

use crate::generate::GenerationError;

/// Error from a session store operation.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No session with the given id.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// No node with the given id in the session's graph.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// Generation failed and the store's fallback policy surfaces errors.
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),
}
