use thiserror::Error;

/// Errors produced by a [`Transport`](crate::transport::Transport)
/// implementation.
///
/// The error is clonable so that a single failed fetch can be delivered to
/// every caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
