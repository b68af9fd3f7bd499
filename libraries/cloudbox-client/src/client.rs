//! Main Cloudbox client and shared response handling.

use crate::auth::AuthClient;
use crate::error::{ClientError, Result};
use crate::files::FilesClient;
use crate::types::{ClientConfig, ErrorBody};
use reqwest::{Client, Response};
use tracing::warn;

/// Entry point for talking to a Cloudbox API.
///
/// Holds the HTTP transport and the normalized base URL. Authenticated
/// request clients are built per call with [`CloudboxClient::files`], which
/// binds the token the caller passes in; the client itself keeps no session.
///
/// No timeout or retry is configured: the transport defaults apply.
///
/// # Example
///
/// ```ignore
/// use cloudbox_client::{ClientConfig, CloudboxClient};
///
/// let client = CloudboxClient::new(ClientConfig::new("https://api.cloudbox.example"))?;
/// let auth = client.auth().login("me@example.com", "secret").await?;
/// let files = client.files(Some(&auth.token)).list().await?;
/// println!("{} files", files.len());
/// ```
#[derive(Clone)]
pub struct CloudboxClient {
    http: Client,
    base_url: String,
}

impl CloudboxClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = normalize_url(&config.url)?;

        let http = Client::builder()
            .user_agent(format!("Cloudbox/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Request)?;

        Ok(Self { http, base_url })
    }

    /// The normalized base URL (no trailing slash).
    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Client for the unauthenticated account endpoints.
    pub fn auth(&self) -> AuthClient<'_> {
        AuthClient::new(&self.http, &self.base_url)
    }

    /// Request client bound to `token`.
    ///
    /// Every request it issues carries `Authorization: Bearer <token>`; with
    /// no token the header is omitted and the server rejects the request.
    pub fn files<'a>(&'a self, token: Option<&'a str>) -> FilesClient<'a> {
        FilesClient::new(&self.http, &self.base_url, token)
    }
}

fn normalize_url(raw: &str) -> Result<String> {
    if raw.trim().is_empty() {
        return Err(ClientError::InvalidUrl("URL cannot be empty".into()));
    }

    let url = raw.trim().trim_end_matches('/').to_string();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ClientError::InvalidUrl(
            "URL must start with http:// or https://".into(),
        ));
    }

    url::Url::parse(&url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;

    Ok(url)
}

/// Map a transport failure, separating "no server answered" from the rest.
pub(crate) fn map_send_error(e: reqwest::Error) -> ClientError {
    if e.is_connect() || e.is_timeout() {
        ClientError::ServerUnreachable(e.to_string())
    } else {
        ClientError::Request(e)
    }
}

/// Pass 2xx responses through and turn everything else into an error.
pub(crate) async fn check_response(response: Response) -> Result<Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    if status.as_u16() == 401 {
        warn!(url = %response.url(), "Request rejected: unauthorized");
        return Err(ClientError::Unauthorized);
    }

    let error_text = response.text().await.unwrap_or_default();
    Err(ClientError::ServerError {
        status: status.as_u16(),
        message: ErrorBody::message_from(&error_text),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_validation() {
        assert!(CloudboxClient::new(ClientConfig::new("https://example.com")).is_ok());
        assert!(CloudboxClient::new(ClientConfig::new("http://localhost:8080")).is_ok());

        assert!(CloudboxClient::new(ClientConfig::new("")).is_err());
        assert!(CloudboxClient::new(ClientConfig::new("not-a-url")).is_err());
        assert!(CloudboxClient::new(ClientConfig::new("ftp://example.com")).is_err());
    }

    #[test]
    fn test_url_normalization() {
        let client = CloudboxClient::new(ClientConfig::new("https://example.com/api//"))
            .expect("valid url");
        assert_eq!(client.url(), "https://example.com/api");
    }
}
