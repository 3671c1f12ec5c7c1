//! Policy Enforcement Point (`PEP`) object.
//!
//! [`PolicyEnforcer`] encapsulates the full PEP flow:
//! build authorization input → call PDP → [`enforce`] the decision.
//!
//! Constructed once during service initialisation with the decision client.
//! Engine failures propagate unchanged; only an explicit `allow: false`
//! becomes [`AuthzError::Denied`].

use std::sync::Arc;

use catalog_security::Principal;

use crate::api::PolicyDecisionClient;
use crate::error::AuthzError;
use crate::models::{AuthorizationInput, PolicyDecisionResponse, ResolvedPath};
use crate::operation::AuthorizableOperation;
use crate::pep::hierarchy::compact_resource_id;
use crate::pep::request_builder::{AccessRequest, build_authorization_input};

/// Interpret a decision for `principal` performing `operation` on `targets`.
///
/// # Errors
///
/// Returns [`AuthzError::Denied`] with the principal name, the operation and
/// the compact resource identifier when `decision.allow` is `false`.
pub fn enforce(
    decision: &PolicyDecisionResponse,
    principal: &Principal,
    operation: AuthorizableOperation,
    targets: &[ResolvedPath],
) -> Result<(), AuthzError> {
    if decision.allow {
        return Ok(());
    }

    let resource = compact_resource_id(targets);
    tracing::debug!(
        principal = %principal.name(),
        operation = %operation,
        resource = %resource,
        "authorization denied by policy"
    );
    Err(AuthzError::Denied {
        principal: principal.name().to_owned(),
        operation,
        resource,
    })
}

/// Policy Enforcement Point.
///
/// Cloneable and cheap to pass around (`Arc` inside).
///
/// # Example
///
/// ```ignore
/// let enforcer = PolicyEnforcer::new(decision_client.clone());
///
/// enforcer
///     .authorize(&principal, AuthorizableOperation::LoadTable, &AccessRequest::new().target(path))
///     .await?;
/// ```
#[derive(Clone)]
pub struct PolicyEnforcer {
    client: Arc<dyn PolicyDecisionClient>,
}

impl PolicyEnforcer {
    /// Create a new enforcer.
    pub fn new(client: Arc<dyn PolicyDecisionClient>) -> Self {
        Self { client }
    }

    /// Build the authorization input without calling the PDP.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::MalformedHierarchy`] if any path is empty.
    pub fn build_input(
        &self,
        principal: &Principal,
        operation: AuthorizableOperation,
        request: &AccessRequest,
    ) -> Result<AuthorizationInput, AuthzError> {
        build_authorization_input(principal, operation, request)
    }

    /// Ask the PDP for a decision and enforce it.
    ///
    /// # Errors
    ///
    /// - [`AuthzError::MalformedHierarchy`] if any path is empty (the PDP is not called)
    /// - [`AuthzError::Unavailable`] / [`AuthzError::MalformedResponse`] from the client, unchanged
    /// - [`AuthzError::Denied`] if the policy disallows the request
    pub async fn authorize(
        &self,
        principal: &Principal,
        operation: AuthorizableOperation,
        request: &AccessRequest,
    ) -> Result<(), AuthzError> {
        let input = self.build_input(principal, operation, request)?;
        let decision = self.client.decide(&input).await?;
        enforce(&decision, principal, operation, request.target_paths())
    }
}

impl std::fmt::Debug for PolicyEnforcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEnforcer").finish_non_exhaustive()
    }
}
