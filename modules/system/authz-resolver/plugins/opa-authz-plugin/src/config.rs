//! Configuration for the OPA policy decision plugin.

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Plugin configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OpaAuthzPluginConfig {
    /// Full URL of the policy decision document, e.g.
    /// `https://opa:8181/v1/data/catalog/authz`. Required.
    pub policy_uri: Option<Url>,

    /// HTTP method used to submit the input document.
    pub method: OpaHttpMethod,

    /// Whole-request timeout in milliseconds, including reading the body. Must be non-zero.
    pub request_timeout_ms: u64,

    /// TCP/TLS connect timeout in milliseconds. Must be non-zero.
    pub connect_timeout_ms: u64,

    /// Extra attempts after a transport failure or a 502/503/504 response.
    pub max_retries: u32,

    /// Fixed pause between attempts in milliseconds.
    pub retry_backoff_ms: u64,

    /// How requests to the engine are authenticated.
    pub auth: OpaAuthConfig,
}

impl Default for OpaAuthzPluginConfig {
    fn default() -> Self {
        Self {
            policy_uri: None,
            method: OpaHttpMethod::Post,
            request_timeout_ms: 5_000,
            connect_timeout_ms: 2_000,
            max_retries: 1,
            retry_backoff_ms: 100,
            auth: OpaAuthConfig::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OpaHttpMethod {
    #[default]
    Post,
    Put,
}

/// Bearer credential scheme for the policy engine.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum OpaAuthConfig {
    /// No `Authorization` header.
    #[default]
    None,

    /// A token fixed for the process lifetime.
    StaticToken { token: SecretString },

    /// OAuth2 client-credentials exchange, cached until shortly before expiry.
    ClientCredentials {
        token_url: Url,
        client_id: String,
        client_secret: SecretString,
        #[serde(default)]
        scopes: Vec<String>,
        #[serde(default = "default_refresh_skew_secs")]
        refresh_skew_secs: u64,
    },
}

fn default_refresh_skew_secs() -> u64 {
    30
}
