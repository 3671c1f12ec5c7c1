//! Bearer token provider selection from configuration.

use std::sync::Arc;
use std::time::Duration;

use catalog_auth::{
    BearerTokenProvider, ClientCredentialsConfig, ClientCredentialsTokenSource,
    RefreshableBearerTokenProvider, StaticBearerTokenProvider,
};

use crate::config::OpaAuthConfig;

/// Build the provider for `auth`, or `None` when requests go unauthenticated.
///
/// The client-credentials source shares `http` with the decision client.
#[must_use]
pub fn token_provider_from_config(
    auth: &OpaAuthConfig,
    http: &reqwest::Client,
) -> Option<Arc<dyn BearerTokenProvider>> {
    match auth {
        OpaAuthConfig::None => None,
        OpaAuthConfig::StaticToken { token } => {
            Some(Arc::new(StaticBearerTokenProvider::new(token.clone())))
        }
        OpaAuthConfig::ClientCredentials {
            token_url,
            client_id,
            client_secret,
            scopes,
            refresh_skew_secs,
        } => {
            let source = ClientCredentialsTokenSource::new(
                http.clone(),
                ClientCredentialsConfig {
                    token_url: token_url.clone(),
                    client_id: client_id.clone(),
                    client_secret: client_secret.clone(),
                    scopes: scopes.clone(),
                },
            );
            let provider = RefreshableBearerTokenProvider::new(Arc::new(source))
                .with_refresh_skew(Duration::from_secs(*refresh_skew_secs));
            Some(Arc::new(provider))
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use catalog_auth::{ExposeSecret, SecretString};

    use super::*;

    #[test]
    fn none_yields_no_provider() {
        assert!(token_provider_from_config(&OpaAuthConfig::None, &reqwest::Client::new()).is_none());
    }

    #[tokio::test]
    async fn static_token_is_served_verbatim() {
        let auth = OpaAuthConfig::StaticToken {
            token: SecretString::from("opa-token".to_owned()),
        };
        let provider = token_provider_from_config(&auth, &reqwest::Client::new()).unwrap();
        assert_eq!(provider.token().await.unwrap().expose_secret(), "opa-token");
    }
}
