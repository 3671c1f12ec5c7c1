//! Catalog AuthZ Resolver SDK
//!
//! This crate provides the policy-engine-agnostic side of catalog authorization:
//!
//! - [`PolicyDecisionClient`] - Trait implemented by policy engine clients
//! - [`DecisionObserver`] - Instrumentation hooks for the exact JSON exchanged
//! - [`AuthorizationInput`], [`PolicyDecisionResponse`] - Decision models
//! - [`ResolvedEntity`], [`ResolvedPath`] - Resolved catalog hierarchy
//! - [`AuthzError`] - Error taxonomy
//! - [`pep`] - PEP helpers (hierarchy encoder, input builder, enforcer)
//!
//! ## Usage
//!
//! ```ignore
//! use authz_resolver_sdk::pep::{AccessRequest, PolicyEnforcer};
//!
//! let enforcer = PolicyEnforcer::new(decision_client);
//!
//! enforcer
//!     .authorize(&principal, AuthorizableOperation::LoadTable, &AccessRequest::new().target(path))
//!     .await?;
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod api;
pub mod error;
pub mod models;
pub mod observer;
pub mod operation;
pub mod pep;

// Re-export main types at crate root
pub use api::PolicyDecisionClient;
pub use error::AuthzError;
pub use models::{
    Actor, AuthorizationInput, EncodedNode, EntityType, ParentRef, PolicyDecisionResponse,
    ResolvedEntity, ResolvedPath, ResourceSet,
};
pub use observer::DecisionObserver;
pub use operation::{AuthorizableOperation, UnknownOperationError};
