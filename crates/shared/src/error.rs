//! Client-facing error type.

use thiserror::Error;

/// Errors surfaced by the transport and domain API calls.
///
/// `Clone` so a single in-flight result can be handed to every caller that
/// joined it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
    /// An `{error}` reported by the server; displays as the server's message.
    #[error("{0}")]
    Server(String),
    #[error("connection closed before a reply arrived")]
    ConnectionClosed,
    #[error("request '{method}' timed out")]
    Timeout { method: String },
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Http { status: 401, .. })
    }
}
