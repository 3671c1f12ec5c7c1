//! Identity value types shared by the authentication and authorization layers.
//!
//! - [`Principal`] - the resolved identity a decision is made for
//! - [`Credential`] - raw identity claims, tagged with their trust origin
//! - [`PrincipalMode`] - whether principals come from the trusted store or from claims
//! - [`CredentialFactory`] - stamps credentials with the deployment's principal mode
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod credential;
pub mod principal;
pub mod principal_mode;

pub use credential::{Credential, CredentialBuilder, CredentialFactory};
pub use principal::Principal;
pub use principal_mode::{ParsePrincipalModeError, PrincipalMode};
