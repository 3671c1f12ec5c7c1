//! HTTP policy decision client for OPA-style engines.
//!
//! The input document is posted as `{"input": ...}` to the configured policy
//! URI and the decision is read from `result.allow`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use authz_resolver_sdk::{
    AuthorizationInput, AuthzError, DecisionObserver, PolicyDecisionClient, PolicyDecisionResponse,
};
use catalog_auth::{BearerTokenProvider, ExposeSecret, SecretString};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::error::OpaPluginError;
use super::token::token_provider_from_config;
use crate::config::{OpaAuthzPluginConfig, OpaHttpMethod};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Serialize)]
struct DecisionRequest<'a> {
    input: &'a AuthorizationInput,
}

/// Outcome of a single HTTP attempt that did not yield a body.
enum AttemptError {
    Transport(reqwest::Error),
    Status(StatusCode),
}

impl AttemptError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status(status) => matches!(
                *status,
                StatusCode::BAD_GATEWAY
                    | StatusCode::SERVICE_UNAVAILABLE
                    | StatusCode::GATEWAY_TIMEOUT
            ),
        }
    }

    fn into_authz(self) -> AuthzError {
        match self {
            Self::Transport(e) if e.is_timeout() => {
                AuthzError::Unavailable(format!("policy engine request timed out: {e}"))
            }
            Self::Transport(e) => {
                AuthzError::Unavailable(format!("policy engine request failed: {e}"))
            }
            Self::Status(status) => {
                AuthzError::Unavailable(format!("policy engine returned status {status}"))
            }
        }
    }
}

/// Builder for [`OpaPolicyDecisionClient`].
#[must_use]
pub struct OpaClientBuilder {
    policy_uri: Url,
    method: OpaHttpMethod,
    request_timeout: Duration,
    connect_timeout: Duration,
    max_retries: u32,
    retry_backoff: Duration,
    token_provider: Option<Arc<dyn BearerTokenProvider>>,
    observers: Vec<Arc<dyn DecisionObserver>>,
}

impl OpaClientBuilder {
    pub fn method(mut self, method: OpaHttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Extra attempts after a retryable failure; `0` disables retries.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Attach `Authorization: Bearer <token>` from `provider` to every request.
    pub fn token_provider(mut self, provider: Arc<dyn BearerTokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn DecisionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`OpaPluginError::HttpClient`] if the HTTP client cannot be built.
    pub fn build(self) -> Result<OpaPolicyDecisionClient, OpaPluginError> {
        let http = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .build()?;
        Ok(self.build_with_http(http))
    }

    fn build_with_http(self, http: reqwest::Client) -> OpaPolicyDecisionClient {
        OpaPolicyDecisionClient {
            http,
            policy_uri: self.policy_uri,
            method: self.method,
            max_retries: self.max_retries,
            retry_backoff: self.retry_backoff,
            token_provider: self.token_provider,
            observers: self.observers,
        }
    }
}

/// [`PolicyDecisionClient`] backed by an OPA-compatible HTTP endpoint.
pub struct OpaPolicyDecisionClient {
    http: reqwest::Client,
    policy_uri: Url,
    method: OpaHttpMethod,
    max_retries: u32,
    retry_backoff: Duration,
    token_provider: Option<Arc<dyn BearerTokenProvider>>,
    observers: Vec<Arc<dyn DecisionObserver>>,
}

impl OpaPolicyDecisionClient {
    /// Start building a client for `policy_uri` with default timeouts and no credential.
    pub fn builder(policy_uri: Url) -> OpaClientBuilder {
        OpaClientBuilder {
            policy_uri,
            method: OpaHttpMethod::Post,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_retries: 1,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            token_provider: None,
            observers: Vec::new(),
        }
    }

    /// Build a client from plugin configuration, including its token provider.
    ///
    /// # Errors
    ///
    /// - [`OpaPluginError::Config`] if `policy_uri` is missing or a timeout is zero
    /// - [`OpaPluginError::HttpClient`] if the HTTP client cannot be built
    pub fn from_config(cfg: &OpaAuthzPluginConfig) -> Result<Self, OpaPluginError> {
        let policy_uri = cfg
            .policy_uri
            .clone()
            .ok_or_else(|| OpaPluginError::Config("policy_uri is required".to_owned()))?;
        if cfg.request_timeout_ms == 0 {
            return Err(OpaPluginError::Config(
                "request_timeout_ms must be greater than zero".to_owned(),
            ));
        }
        if cfg.connect_timeout_ms == 0 {
            return Err(OpaPluginError::Config(
                "connect_timeout_ms must be greater than zero".to_owned(),
            ));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(cfg.connect_timeout_ms))
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()?;

        let mut builder = Self::builder(policy_uri)
            .method(cfg.method)
            .max_retries(cfg.max_retries)
            .retry_backoff(Duration::from_millis(cfg.retry_backoff_ms));
        if let Some(provider) = token_provider_from_config(&cfg.auth, &http) {
            builder = builder.token_provider(provider);
        }

        Ok(builder.build_with_http(http))
    }

    /// Register an observer after construction.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn DecisionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    #[must_use]
    pub fn policy_uri(&self) -> &Url {
        &self.policy_uri
    }

    async fn bearer_token(&self) -> Result<Option<SecretString>, AuthzError> {
        let Some(provider) = &self.token_provider else {
            return Ok(None);
        };
        provider.token().await.map(Some).map_err(|e| {
            warn!(error = %e, "failed to acquire policy engine credential");
            AuthzError::Unavailable(format!("failed to acquire policy engine credential: {e}"))
        })
    }

    async fn send_once(
        &self,
        body: &[u8],
        token: Option<&SecretString>,
    ) -> Result<Vec<u8>, AttemptError> {
        let request = match self.method {
            OpaHttpMethod::Post => self.http.post(self.policy_uri.clone()),
            OpaHttpMethod::Put => self.http.put(self.policy_uri.clone()),
        };
        let mut request = request
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, "application/json")
            .body(body.to_vec());
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(AttemptError::Transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::Status(status));
        }
        let bytes = response.bytes().await.map_err(AttemptError::Transport)?;
        Ok(bytes.to_vec())
    }

    /// Send with bounded retries on transport failures and 502/503/504.
    async fn send_with_retry(
        &self,
        body: &[u8],
        token: Option<&SecretString>,
    ) -> Result<Vec<u8>, AuthzError> {
        let mut attempt = 0u32;
        loop {
            match self.send_once(body, token).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let err = e.into_authz();
                    warn!(attempt, error = %err, "retrying policy engine request");
                    tokio::time::sleep(self.retry_backoff).await;
                }
                Err(e) => {
                    let err = e.into_authz();
                    warn!(attempts = attempt + 1, error = %err, "policy engine unavailable");
                    return Err(err);
                }
            }
        }
    }
}

impl std::fmt::Debug for OpaPolicyDecisionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpaPolicyDecisionClient")
            .field("policy_uri", &self.policy_uri.as_str())
            .field("method", &self.method)
            .field("max_retries", &self.max_retries)
            .field("authenticated", &self.token_provider.is_some())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PolicyDecisionClient for OpaPolicyDecisionClient {
    async fn decide(
        &self,
        input: &AuthorizationInput,
    ) -> Result<PolicyDecisionResponse, AuthzError> {
        let token = self.bearer_token().await?;

        let request = serde_json::to_value(DecisionRequest { input }).map_err(|e| {
            AuthzError::Unavailable(format!("failed to serialize authorization input: {e}"))
        })?;
        for observer in &self.observers {
            observer.on_request(&request);
        }
        let body = serde_json::to_vec(&request).map_err(|e| {
            AuthzError::Unavailable(format!("failed to serialize authorization input: {e}"))
        })?;

        let bytes = self.send_with_retry(&body, token.as_ref()).await?;

        let document: Value = serde_json::from_slice(&bytes).map_err(|e| {
            warn!(error = %e, "policy engine response is not JSON");
            AuthzError::MalformedResponse(format!("response body is not JSON: {e}"))
        })?;
        for observer in &self.observers {
            observer.on_response(&document);
        }

        let decision = PolicyDecisionResponse::from_result_document(&document).inspect_err(|e| {
            warn!(error = %e, "policy engine response has no decision");
        })?;
        debug!(
            principal = %input.actor.principal,
            operation = %input.action,
            allow = decision.allow,
            "policy decision received"
        );
        Ok(decision)
    }
}
