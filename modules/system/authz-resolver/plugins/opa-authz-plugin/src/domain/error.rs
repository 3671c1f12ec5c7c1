/// Errors raised while constructing the OPA decision client.
///
/// Decision-time failures are reported as [`authz_resolver_sdk::AuthzError`].
#[derive(Debug, thiserror::Error)]
pub enum OpaPluginError {
    #[error("invalid OPA plugin configuration: {0}")]
    Config(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
