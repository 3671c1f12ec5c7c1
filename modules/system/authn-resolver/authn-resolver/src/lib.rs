//! Catalog AuthN Resolver
//!
//! Resolves the in-process [`Principal`](catalog_security::Principal) from an
//! authenticated [`Credential`](catalog_security::Credential):
//!
//! - [`Authenticator`] - Trusted-store lookup (internal mode) or claims synthesis (external mode)
//! - [`IdentityStore`] - Trusted identity store seam, with [`StaticIdentityStore`]
//! - [`ClaimsCredentialMapper`] - Verified token claims to credential
//! - [`validate_principal_mode`] - Startup consistency check
//!
//! ## Usage
//!
//! ```ignore
//! validate_principal_mode(&authz_cfg, &authn_cfg)?;
//!
//! let authenticator = Authenticator::new(authz_cfg.principal_mode, store);
//! let principal = authenticator.authenticate(&credential).await?;
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;
pub mod error;

pub use config::{
    AuthenticationConfig, AuthenticationRealmConfig, AuthenticationType, AuthorizationConfig,
    DEFAULT_REALM_KEY,
};
pub use domain::authenticator::{Authenticator, PRINCIPAL_ID_ATTRIBUTE};
pub use domain::claims::{ClaimsCredentialMapper, ClaimsMappingConfig};
pub use domain::store::{
    IdentityStore, PrincipalLookup, StaticIdentityStore, StaticIdentityStoreConfig,
    StaticPrincipalConfig,
};
pub use domain::validator::validate_principal_mode;
pub use error::{AuthnError, ConfigError, IdentityStoreError};
