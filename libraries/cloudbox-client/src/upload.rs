//! File upload and the accepted file-type allow-list.

use crate::client::{check_response, map_send_error};
use crate::error::{ClientError, Result};
use crate::files::FilesClient;
use crate::types::{FileRecord, UploadFile};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use std::path::Path;
use tracing::{debug, info};

/// Accepted `(MIME type, extensions)` pairs.
pub const ALLOWED_FILE_TYPES: &[(&str, &[&str])] = &[
    ("text/plain", &["txt"]),
    ("image/jpeg", &["jpg", "jpeg"]),
    ("image/png", &["png"]),
    ("application/pdf", &["pdf"]),
    ("application/json", &["json"]),
];

/// Check a file name and MIME type against [`ALLOWED_FILE_TYPES`].
///
/// Both must match the same entry: a `.png` declared as `text/plain` is
/// rejected.
pub fn validate_file_type(file_name: &str, mime_type: &str) -> Result<()> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let mime = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let allowed = extension.as_deref().is_some_and(|ext| {
        ALLOWED_FILE_TYPES
            .iter()
            .any(|(allowed_mime, extensions)| *allowed_mime == mime && extensions.contains(&ext))
    });

    if allowed {
        Ok(())
    } else {
        Err(ClientError::Validation(format!(
            "Unsupported file type: {} ({})",
            file_name, mime_type
        )))
    }
}

/// Get the MIME type for a file from its extension.
pub fn mime_type_for_file(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("txt") => "text/plain",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("pdf") => "application/pdf",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

impl UploadFile {
    /// Read a file from disk, inferring its MIME type from the extension.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                ClientError::Validation(format!("Not a file path: {}", path.display()))
            })?
            .to_string();

        let contents = tokio::fs::read(path).await.map_err(|e| {
            ClientError::Validation(format!("Cannot read {}: {}", path.display(), e))
        })?;

        Ok(Self {
            file_name,
            mime_type: mime_type_for_file(path).to_string(),
            contents,
        })
    }
}

impl FilesClient<'_> {
    /// Upload a single file.
    ///
    /// Files outside the allow-list are rejected before any request is made.
    pub async fn upload(&self, file: &UploadFile) -> Result<FileRecord> {
        validate_file_type(&file.file_name, &file.mime_type)?;

        debug!(file = %file.file_name, size = file.contents.len(), "Uploading file");

        let part = Part::bytes(file.contents.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)?;
        let form = Form::new().part("file", part);

        let response = self
            .request(Method::POST, "/upload")
            .multipart(form)
            .send()
            .await
            .map_err(map_send_error)?;

        let record: FileRecord = check_response(response).await?.json().await.map_err(|e| {
            ClientError::ParseError(format!("Failed to parse upload response: {}", e))
        })?;

        info!(
            file_id = %record.id,
            file = %record.file_name,
            size = record.size,
            "File uploaded"
        );

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_pairs() {
        assert!(validate_file_type("notes.txt", "text/plain").is_ok());
        assert!(validate_file_type("photo.JPG", "image/jpeg").is_ok());
        assert!(validate_file_type("photo.jpeg", "image/jpeg").is_ok());
        assert!(validate_file_type("shot.png", "image/png").is_ok());
        assert!(validate_file_type("report.pdf", "application/pdf").is_ok());
        assert!(validate_file_type("data.json", "application/json; charset=utf-8").is_ok());
    }

    #[test]
    fn test_rejected_pairs() {
        // Mismatched extension and MIME type
        assert!(validate_file_type("shot.png", "text/plain").is_err());
        // Unknown type
        assert!(validate_file_type("movie.mp4", "video/mp4").is_err());
        // No extension
        assert!(validate_file_type("README", "text/plain").is_err());

        match validate_file_type("archive.zip", "application/zip") {
            Err(ClientError::Validation(msg)) => assert!(msg.contains("Unsupported file type")),
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type_for_file(Path::new("a.txt")), "text/plain");
        assert_eq!(mime_type_for_file(Path::new("a.JPEG")), "image/jpeg");
        assert_eq!(mime_type_for_file(Path::new("a.pdf")), "application/pdf");
        assert_eq!(
            mime_type_for_file(Path::new("a.unknown")),
            "application/octet-stream"
        );
    }
}
