//! Account endpoints: login and registration.

use crate::client::map_send_error;
use crate::error::{ClientError, Result};
use crate::types::{AuthResponse, ErrorBody, LoginRequest, RegisterRequest};
use reqwest::{Client, Response};
use tracing::{debug, info, warn};

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Authentication client for Cloudbox.
pub struct AuthClient<'a> {
    http: &'a Client,
    base_url: &'a str,
}

impl<'a> AuthClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str) -> Self {
        Self { http, base_url }
    }

    /// Login with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let url = format!("{}/login", self.base_url);
        debug!(url = %url, email = %email, "Attempting login");

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(map_send_error)?;

        let auth = parse_auth_response(response, "Invalid email or password").await?;
        info!(email = %email, "Login successful");
        Ok(auth)
    }

    /// Create an account and sign in with it.
    ///
    /// The password length is checked before anything is sent.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthResponse> {
        validate_password(password)?;

        let url = format!("{}/register", self.base_url);
        debug!(url = %url, email = %email, "Registering account");

        let request = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(map_send_error)?;

        let auth = parse_auth_response(response, "Registration failed").await?;
        info!(email = %email, "Account created");
        Ok(auth)
    }
}

/// Reject passwords shorter than [`MIN_PASSWORD_LENGTH`] characters.
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ClientError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

async fn parse_auth_response(response: Response, fallback: &str) -> Result<AuthResponse> {
    let status = response.status();

    if status.is_success() {
        return response.json().await.map_err(|e| {
            ClientError::ParseError(format!("Failed to parse auth response: {}", e))
        });
    }

    let error_text = response.text().await.unwrap_or_default();
    let message = ErrorBody::message_from(&error_text);

    match status.as_u16() {
        400 | 401 | 403 | 409 => {
            warn!(status = %status, error = %message, "Authentication rejected");
            let message = if message.is_empty() {
                fallback.to_string()
            } else {
                message
            };
            Err(ClientError::AuthFailed(message))
        }
        code => Err(ClientError::ServerError {
            status: code,
            message,
        }),
    }
}
