//! Types for Cloudbox API requests and responses.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Configuration for connecting to a Cloudbox API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API (e.g., "https://api.cloudbox.example")
    pub url: String,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

// =============================================================================
// Authentication Types
// =============================================================================

/// Request body for the login endpoint.
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for the account creation endpoint.
#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Response from a successful login or registration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// Identity metadata returned alongside a token.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(from = "RawUserProfile")]
pub struct UserProfile {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Wire shape of [`UserProfile`]; the server may send `_id`, `id` or both.
#[derive(Deserialize)]
struct RawUserProfile {
    #[serde(default, rename = "_id")]
    mongo_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl From<RawUserProfile> for UserProfile {
    fn from(raw: RawUserProfile) -> Self {
        Self {
            id: raw.mongo_id.or(raw.id),
            name: raw.name,
            email: raw.email,
        }
    }
}

// =============================================================================
// File Types
// =============================================================================

/// Metadata of one stored file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", try_from = "RawFileRecord")]
pub struct FileRecord {
    /// Server-assigned id, unique per user
    pub id: String,
    pub file_name: String,
    /// Size in bytes
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub file_url: Option<String>,
}

/// Wire shape of [`FileRecord`]; `_id` wins when both ids are present.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFileRecord {
    #[serde(default, rename = "_id")]
    mongo_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    file_name: String,
    size: u64,
    created_at: DateTime<Utc>,
    #[serde(default)]
    file_url: Option<String>,
}

impl TryFrom<RawFileRecord> for FileRecord {
    type Error = String;

    fn try_from(raw: RawFileRecord) -> std::result::Result<Self, Self::Error> {
        let id = raw
            .mongo_id
            .or(raw.id)
            .ok_or_else(|| "file record has neither `_id` nor `id`".to_string())?;

        Ok(Self {
            id,
            file_name: raw.file_name,
            size: raw.size,
            created_at: raw.created_at,
            file_url: raw.file_url,
        })
    }
}

/// Preview descriptor returned by the preview endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewDescriptor {
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl PreviewDescriptor {
    /// The preview URL, if the server supplied a non-empty one.
    pub fn url(&self) -> Option<&str> {
        self.preview_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

// =============================================================================
// Upload / Download Types
// =============================================================================

/// A file selected for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub mime_type: String,
    pub contents: Vec<u8>,
}

impl UploadFile {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        contents: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            contents: contents.into(),
        }
    }
}

/// Bytes of a downloaded file together with the resolved file name.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub file_id: String,
    pub file_name: String,
    pub contents: Bytes,
}

// =============================================================================
// Error Types
// =============================================================================

/// Error payload sent by the API on non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Extract a human message from a raw response body.
    ///
    /// Falls back to the trimmed body text when it is not a JSON error object.
    pub fn message_from(body: &str) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => parsed
                .message
                .or(parsed.error)
                .unwrap_or_else(|| body.trim().to_string()),
            Err(_) => body.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_record_accepts_mongo_id() {
        let record: FileRecord = serde_json::from_value(serde_json::json!({
            "_id": "abc123",
            "fileName": "notes.txt",
            "size": 42,
            "createdAt": "2024-03-01T10:00:00Z",
            "fileUrl": "https://cdn.example.com/notes.txt"
        }))
        .unwrap();

        assert_eq!(record.id, "abc123");
        assert_eq!(record.file_name, "notes.txt");
        assert_eq!(record.size, 42);
        assert!(record.file_url.is_some());
    }

    #[test]
    fn test_file_record_with_both_ids() {
        let record: FileRecord = serde_json::from_value(serde_json::json!({
            "_id": "abc",
            "id": "abc",
            "fileName": "a.txt",
            "size": 1,
            "createdAt": "2024-03-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(record.id, "abc");

        let record: FileRecord = serde_json::from_value(serde_json::json!({
            "id": "plain",
            "fileName": "a.txt",
            "size": 1,
            "createdAt": "2024-03-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(record.id, "plain");
    }

    #[test]
    fn test_file_record_without_id_rejected() {
        let result = serde_json::from_value::<FileRecord>(serde_json::json!({
            "fileName": "a.txt",
            "size": 1,
            "createdAt": "2024-03-01T10:00:00Z"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_user_profile_with_both_ids() {
        let user: UserProfile = serde_json::from_value(serde_json::json!({
            "_id": "u1",
            "id": "u1",
            "name": "Ada"
        }))
        .unwrap();
        assert_eq!(user.id.as_deref(), Some("u1"));
        assert_eq!(user.name.as_deref(), Some("Ada"));
        assert!(user.email.is_none());
    }

    #[test]
    fn test_file_record_serializes_plain_id() {
        let record = FileRecord {
            id: "abc".into(),
            file_name: "a.txt".into(),
            size: 1,
            created_at: "2024-03-01T10:00:00Z".parse().unwrap(),
            file_url: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "abc");

        let back: FileRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_preview_url_ignores_blank() {
        let descriptor = PreviewDescriptor {
            preview_url: Some("   ".into()),
            ..Default::default()
        };
        assert!(descriptor.url().is_none());
    }

    #[test]
    fn test_error_body_message() {
        assert_eq!(
            ErrorBody::message_from(r#"{"message":"Invalid credentials"}"#),
            "Invalid credentials"
        );
        assert_eq!(
            ErrorBody::message_from(r#"{"error":"User already exists"}"#),
            "User already exists"
        );
        assert_eq!(ErrorBody::message_from("Bad Gateway\n"), "Bad Gateway");
    }
}
