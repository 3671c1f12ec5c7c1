//! OPA policy decision plugin.
//!
//! Implements [`authz_resolver_sdk::PolicyDecisionClient`] over HTTP(S) for
//! engines speaking the OPA data API.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;

pub use config::{OpaAuthConfig, OpaAuthzPluginConfig, OpaHttpMethod};
pub use domain::client::{OpaClientBuilder, OpaPolicyDecisionClient};
pub use domain::error::OpaPluginError;
pub use domain::token::token_provider_from_config;
