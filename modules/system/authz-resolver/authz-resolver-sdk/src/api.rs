//! Policy decision point abstraction.

use async_trait::async_trait;

use crate::error::AuthzError;
use crate::models::{AuthorizationInput, PolicyDecisionResponse};

/// Client for a remote policy engine.
///
/// Implementations submit the document and interpret the structured decision.
/// A negative outcome is returned as `allow == false`, never as an error;
/// errors are reserved for infrastructure failures.
///
/// ```ignore
/// let decision = client.decide(&input).await?;
/// pep::enforce(&decision, &principal, operation, &targets)?;
/// ```
#[async_trait]
pub trait PolicyDecisionClient: Send + Sync {
    /// Submit an authorization input and return the engine's decision.
    ///
    /// # Errors
    ///
    /// - `Unavailable` on transport failure, timeout, non-success status or
    ///   failure to acquire the engine credential
    /// - `MalformedResponse` if the body lacks a boolean `result.allow`
    async fn decide(&self, input: &AuthorizationInput)
    -> Result<PolicyDecisionResponse, AuthzError>;
}
