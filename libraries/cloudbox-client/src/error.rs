//! Error types for the Cloudbox client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when talking to the Cloudbox API.
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server is offline or unreachable
    #[error("Server unreachable: {0}")]
    ServerUnreachable(String),

    /// Server returned an error response
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Credentials rejected or account could not be created
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Token missing, expired or revoked
    #[error("Authentication required")]
    Unauthorized,

    /// Input rejected before any request was made
    #[error("{0}")]
    Validation(String),

    /// Invalid server URL
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse server response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Preview endpoint answered without a usable URL
    #[error("Preview URL not found")]
    PreviewUrlNotFound,

    /// IO error while reading a file to upload
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`ClientError`], used by consumers to decide
/// how a failure is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Invalid credentials or registration conflict
    Auth,
    /// Missing or expired token; the session has to be torn down
    Unauthorized,
    /// Rejected locally before submission
    Validation,
    /// No response from the server
    Network,
    /// Non-2xx response or unusable payload
    Server,
    /// A local side effect failed (reading, saving or opening a file)
    Local,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Request(_) | ClientError::ServerUnreachable(_) => ErrorKind::Network,
            ClientError::ServerError { .. }
            | ClientError::ParseError(_)
            | ClientError::PreviewUrlNotFound => ErrorKind::Server,
            ClientError::AuthFailed(_) => ErrorKind::Auth,
            ClientError::Unauthorized => ErrorKind::Unauthorized,
            ClientError::Validation(_) | ClientError::InvalidUrl(_) => ErrorKind::Validation,
            ClientError::Io(_) => ErrorKind::Local,
        }
    }

    /// HTTP status carried by the error, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::ServerError { status, .. } => Some(*status),
            ClientError::Unauthorized => Some(401),
            ClientError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Message suitable for showing to a user.
    ///
    /// Server errors expose the server-supplied message rather than the
    /// formatted status line.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::ServerError { message, status } if message.is_empty() => {
                format!("Request failed with status {}", status)
            }
            ClientError::ServerError { message, .. } | ClientError::AuthFailed(message) => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(ClientError::Unauthorized.kind(), ErrorKind::Unauthorized);
        assert_eq!(
            ClientError::AuthFailed("bad".into()).kind(),
            ErrorKind::Auth
        );
        assert_eq!(
            ClientError::Validation("nope".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ClientError::ServerUnreachable("down".into()).kind(),
            ErrorKind::Network
        );
        assert_eq!(ClientError::PreviewUrlNotFound.kind(), ErrorKind::Server);
    }

    #[test]
    fn test_status() {
        let err = ClientError::ServerError {
            status: 503,
            message: String::new(),
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(ClientError::Unauthorized.status(), Some(401));
        assert_eq!(ClientError::PreviewUrlNotFound.status(), None);
    }

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = ClientError::ServerError {
            status: 500,
            message: "disk full".into(),
        };
        assert_eq!(err.user_message(), "disk full");

        let err = ClientError::ServerError {
            status: 502,
            message: String::new(),
        };
        assert!(err.user_message().contains("502"));
    }
}
