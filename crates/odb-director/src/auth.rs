//! Authorization headers for director requests
//!
//! Headers are built per request so that expiring credentials (UAA tokens)
//! are refreshed without the client holding any token state.

use crate::error::DirectorError;
use base64::Engine;
use serde::Deserialize;

/// Builds the `Authorization` header value for one director request
#[async_trait::async_trait]
pub trait AuthHeaderBuilder: Send + Sync {
    /// Build the header value
    async fn build(&self) -> Result<String, DirectorError>;
}

/// HTTP basic authentication
#[derive(Clone)]
pub struct BasicAuthHeaderBuilder {
    header: String,
}

impl BasicAuthHeaderBuilder {
    /// Create from username and password
    #[must_use]
    pub fn new(username: &str, password: &str) -> Self {
        let encoded =
            base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
        Self {
            header: format!("Basic {encoded}"),
        }
    }
}

impl std::fmt::Debug for BasicAuthHeaderBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthHeaderBuilder").finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl AuthHeaderBuilder for BasicAuthHeaderBuilder {
    async fn build(&self) -> Result<String, DirectorError> {
        Ok(self.header.clone())
    }
}

/// UAA client-credentials grant, one token request per header
pub struct UaaClientCredentialsHeaderBuilder {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl UaaClientCredentialsHeaderBuilder {
    /// Create for the UAA at `uaa_url`
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        uaa_url: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            token_url: format!("{}/oauth/token", uaa_url.trim_end_matches('/')),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl std::fmt::Debug for UaaClientCredentialsHeaderBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UaaClientCredentialsHeaderBuilder")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl AuthHeaderBuilder for UaaClientCredentialsHeaderBuilder {
    async fn build(&self) -> Result<String, DirectorError> {
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| DirectorError::Auth(format!("token request to {} failed: {e}", self.token_url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectorError::Auth(format!(
                "token request to {} returned {status}",
                self.token_url
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| DirectorError::Auth(format!("cannot parse token response: {e}")))?;

        Ok(format!("{} {}", token.token_type, token.access_token))
    }
}
