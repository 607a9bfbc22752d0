//! Error types for node RPC operations.

/// Errors produced by algod requests.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// The HTTP request itself failed (connect, timeout, TLS).
    #[error("node request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The node answered with a non-success status.
    #[error("node returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// The node's error text, verbatim.
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("could not parse node response: {0}")]
    Parse(String),
}

impl NodeError {
    /// Returns the node's error message for API-level failures.
    #[must_use]
    pub fn api_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } => Some(message),
            Self::Transport(_) | Self::Parse(_) => None,
        }
    }
}
