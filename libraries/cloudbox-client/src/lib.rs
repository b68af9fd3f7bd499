//! Cloudbox Client
//!
//! HTTP client library for the Cloudbox file storage API.
//!
//! # Features
//!
//! - **Authentication**: Login and account registration
//! - **Files**: List, delete and preview stored files
//! - **Upload**: Multipart upload with a client-side file-type allow-list
//! - **Download**: File bytes with the name taken from `Content-Disposition`
//!
//! # Example
//!
//! ```ignore
//! use cloudbox_client::{ClientConfig, CloudboxClient, UploadFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CloudboxClient::new(ClientConfig::new("https://api.cloudbox.example"))?;
//!
//!     let auth = client.auth().login("me@example.com", "secret").await?;
//!     let files = client.files(Some(&auth.token));
//!
//!     let upload = UploadFile::new("notes.txt", "text/plain", b"hello".to_vec());
//!     let record = files.upload(&upload).await?;
//!     println!("Uploaded {} ({} bytes)", record.file_name, record.size);
//!
//!     Ok(())
//! }
//! ```

mod auth;
mod client;
mod download;
mod error;
mod files;
mod types;
mod upload;

pub use auth::{validate_password, AuthClient, MIN_PASSWORD_LENGTH};
pub use client::CloudboxClient;
pub use download::{fallback_file_name, filename_from_content_disposition};
pub use error::{ClientError, ErrorKind, Result};
pub use files::FilesClient;
pub use types::{
    AuthResponse, ClientConfig, DownloadedFile, FileRecord, PreviewDescriptor, UploadFile,
    UserProfile,
};
pub use upload::{mime_type_for_file, validate_file_type, ALLOWED_FILE_TYPES};
