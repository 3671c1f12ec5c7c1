#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

// Core modules
pub mod errors;
pub mod provider;

// Token lifecycle
pub mod refreshable;

// Outbound OAuth2 client credentials
pub mod oauth2;

// Core exports
pub use errors::TokenError;
pub use provider::{BearerTokenProvider, StaticBearerTokenProvider};

// Token lifecycle exports
pub use refreshable::{FetchedToken, RefreshableBearerTokenProvider, TokenSource};

// Outbound OAuth2 exports
pub use oauth2::{ClientCredentialsConfig, ClientCredentialsTokenSource};
pub use secrecy::{ExposeSecret, SecretString};
