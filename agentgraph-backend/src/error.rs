//! Engine error taxonomy.
//!
//! Every fallible engine operation returns [`EngineError`]. Provider clients
//! speak `Result<_, String>` at the wire and are wrapped into
//! [`EngineError::Execution`] at the agent seam.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or missing configuration (no entry point, bad agent config).
    /// Fatal at construction or first use; never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A node or message lookup failed. Fatal for the current traversal.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// A memory id was written twice. The store never overwrites.
    #[error("memory message '{0}' already exists")]
    DuplicateKey(String),

    /// A completion or embedding provider call failed. Fatal for the
    /// agent's run; the executor does not retry.
    #[error("execution failed: {0}")]
    Execution(String),
}

impl EngineError {
    pub fn node_not_found(id: impl Into<String>) -> Self {
        EngineError::NotFound {
            kind: "node",
            id: id.into(),
        }
    }

    pub fn message_not_found(id: impl Into<String>) -> Self {
        EngineError::NotFound {
            kind: "message",
            id: id.into(),
        }
    }
}
