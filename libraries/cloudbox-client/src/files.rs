//! File listing, deletion and preview.

use crate::client::{check_response, map_send_error};
use crate::error::{ClientError, Result};
use crate::types::{FileRecord, PreviewDescriptor};
use reqwest::{Client, Method, RequestBuilder};
use tracing::debug;

/// Authenticated file client for Cloudbox.
///
/// Built by [`crate::CloudboxClient::files`]; carries the token it was built
/// with for its whole lifetime.
pub struct FilesClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    token: Option<&'a str>,
}

impl<'a> FilesClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str, token: Option<&'a str>) -> Self {
        Self {
            http,
            base_url,
            token,
        }
    }

    /// The token attached to requests, if any.
    pub fn token(&self) -> Option<&str> {
        self.token
    }

    /// Start a request against `path` (relative to the base URL) with the
    /// bearer token attached.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.http.request(method, url);
        match self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// List every file owned by the authenticated user.
    pub async fn list(&self) -> Result<Vec<FileRecord>> {
        debug!(base_url = %self.base_url, "Fetching files");

        let response = self
            .request(Method::GET, "/files")
            .send()
            .await
            .map_err(map_send_error)?;

        let files: Vec<FileRecord> = check_response(response).await?.json().await.map_err(|e| {
            ClientError::ParseError(format!("Failed to parse file list: {}", e))
        })?;

        debug!(count = files.len(), "Fetched files");
        Ok(files)
    }

    /// Delete a file on the server.
    pub async fn delete(&self, file_id: &str) -> Result<()> {
        let path = format!("/files/{}", encode_id(file_id));
        debug!(file_id = %file_id, "Deleting file");

        let response = self
            .request(Method::DELETE, &path)
            .send()
            .await
            .map_err(map_send_error)?;

        check_response(response).await?;
        debug!(file_id = %file_id, "File deleted");
        Ok(())
    }

    /// Fetch the preview descriptor for a file.
    ///
    /// Fails with [`ClientError::PreviewUrlNotFound`] when the server answers
    /// without a usable `previewUrl`.
    pub async fn preview(&self, file_id: &str) -> Result<PreviewDescriptor> {
        let path = format!("/files/{}/preview", encode_id(file_id));
        debug!(file_id = %file_id, "Requesting preview");

        let response = self
            .request(Method::GET, &path)
            .send()
            .await
            .map_err(map_send_error)?;

        let descriptor: PreviewDescriptor =
            check_response(response).await?.json().await.map_err(|e| {
                ClientError::ParseError(format!("Failed to parse preview response: {}", e))
            })?;

        if descriptor.url().is_none() {
            return Err(ClientError::PreviewUrlNotFound);
        }

        Ok(descriptor)
    }
}

pub(crate) fn encode_id(file_id: &str) -> String {
    urlencoding::encode(file_id).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_id() {
        assert_eq!(encode_id("65f1a2"), "65f1a2");
        assert_eq!(encode_id("a/b c"), "a%2Fb%20c");
    }
}
