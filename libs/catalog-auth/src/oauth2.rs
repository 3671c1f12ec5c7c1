//! OAuth2 client-credentials exchange used as a [`TokenSource`].

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::errors::TokenError;
use crate::refreshable::{FetchedToken, TokenSource};

/// Settings for a client-credentials token exchange.
#[derive(Debug, Clone)]
pub struct ClientCredentialsConfig {
    pub token_url: Url,
    pub client_id: String,
    pub client_secret: SecretString,
    pub scopes: Vec<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    token_type: Option<String>,
}

/// Fetches tokens from an OAuth2 token endpoint using `grant_type=client_credentials`.
pub struct ClientCredentialsTokenSource {
    http: reqwest::Client,
    config: ClientCredentialsConfig,
}

impl ClientCredentialsTokenSource {
    /// Build a source that shares the given HTTP client.
    #[must_use]
    pub fn new(http: reqwest::Client, config: ClientCredentialsConfig) -> Self {
        Self { http, config }
    }

    fn form_body(&self) -> Result<String, TokenError> {
        let scope = self.config.scopes.join(" ");
        let mut fields: Vec<(&str, &str)> = vec![
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
        ];
        if !scope.is_empty() {
            fields.push(("scope", scope.as_str()));
        }
        serde_urlencoded::to_string(&fields).map_err(|e| TokenError::Config(e.to_string()))
    }
}

impl std::fmt::Debug for ClientCredentialsTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentialsTokenSource")
            .field("token_url", &self.config.token_url.as_str())
            .field("client_id", &self.config.client_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenSource for ClientCredentialsTokenSource {
    async fn fetch(&self) -> Result<FetchedToken, TokenError> {
        let body = self.form_body()?;

        let response = self
            .http
            .post(self.config.token_url.clone())
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .header(reqwest::header::ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| TokenError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "token endpoint rejected client credentials");
            return Err(TokenError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TokenError::Transport(e.to_string()))?;
        let parsed: TokenResponse = serde_json::from_slice(&bytes)
            .map_err(|e| TokenError::InvalidResponse(e.to_string()))?;

        if let Some(token_type) = parsed.token_type.as_deref()
            && !token_type.eq_ignore_ascii_case("bearer")
        {
            return Err(TokenError::InvalidResponse(format!(
                "unsupported token type '{token_type}'"
            )));
        }
        if parsed.access_token.is_empty() {
            return Err(TokenError::InvalidResponse(
                "empty access_token".to_owned(),
            ));
        }

        Ok(FetchedToken {
            value: SecretString::from(parsed.access_token),
            expires_in: parsed.expires_in.map(Duration::from_secs),
        })
    }
}
