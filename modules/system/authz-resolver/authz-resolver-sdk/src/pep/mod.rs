//! PEP (Policy Enforcement Point) helpers.
//!
//! Convenience functions for modules acting as PEPs:
//! - [`hierarchy::encode_path`] - Reduces a resolved path to an [`EncodedNode`](crate::EncodedNode)
//! - [`request_builder::build_authorization_input`] - Builds the decision document from a principal
//! - [`enforcer::enforce`] - Turns a decision into `Ok(())` or [`AuthzError::Denied`](crate::AuthzError::Denied)
//! - [`PolicyEnforcer`] - The full flow against a [`PolicyDecisionClient`](crate::PolicyDecisionClient)

pub mod enforcer;
pub mod hierarchy;
pub mod request_builder;

pub use enforcer::{PolicyEnforcer, enforce};
pub use hierarchy::{compact_resource_id, encode_path, encode_paths};
pub use request_builder::{AccessRequest, build_authorization_input};
