use cloudbox_client::{ClientError, ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Payload every failed operation settles with.
///
/// Carries enough for a consumer to pick a presentation without looking at
/// transport errors: the [`ErrorKind`], a human message and the HTTP status
/// when the server answered.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct Rejection {
    pub kind: ErrorKind,
    pub message: String,
    pub status: Option<u16>,
}

impl Rejection {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ErrorKind::Unauthorized
    }
}

impl From<&ClientError> for Rejection {
    fn from(err: &ClientError) -> Self {
        Self {
            kind: err.kind(),
            message: err.user_message(),
            status: err.status(),
        }
    }
}

impl From<ClientError> for Rejection {
    fn from(err: ClientError) -> Self {
        Self::from(&err)
    }
}

/// Errors from session persistence.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse stored session: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_from_client_error() {
        let rejection = Rejection::from(ClientError::ServerError {
            status: 500,
            message: "boom".into(),
        });
        assert_eq!(rejection.kind, ErrorKind::Server);
        assert_eq!(rejection.message, "boom");
        assert_eq!(rejection.status, Some(500));

        let rejection = Rejection::from(ClientError::Unauthorized);
        assert!(rejection.is_unauthorized());
        assert_eq!(rejection.status, Some(401));
    }

    #[test]
    fn test_rejection_serializes_kind() {
        let rejection = Rejection::new(ErrorKind::Validation, "Unsupported file type");
        let json = serde_json::to_value(&rejection).unwrap();
        assert_eq!(json["kind"], "validation");
        assert_eq!(json["message"], "Unsupported file type");
        assert!(json["status"].is_null());
    }
}
