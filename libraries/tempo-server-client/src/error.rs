//! Error types for the catalog client.

use tempo_core::TempoError;
use thiserror::Error;

/// Errors that can occur when talking to the catalog server.
#[derive(Error, Debug)]
pub enum ServerClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error response
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Authentication required but no token available, or token rejected
    #[error("Authentication required")]
    AuthRequired,

    /// Invalid server URL
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse server response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Server is offline or unreachable
    #[error("Server unreachable: {0}")]
    ServerUnreachable(String),
}

impl From<ServerClientError> for TempoError {
    fn from(err: ServerClientError) -> Self {
        match err {
            ServerClientError::AuthRequired => TempoError::Unauthorized,
            ServerClientError::ServerError { status: 404, message } => {
                TempoError::not_found("resource", message)
            }
            ServerClientError::InvalidUrl(msg) => TempoError::invalid_input(msg),
            ServerClientError::ParseError(msg) => TempoError::Other(msg),
            other => TempoError::network(other.to_string()),
        }
    }
}

/// Result type for catalog client operations.
pub type Result<T> = std::result::Result<T, ServerClientError>;
