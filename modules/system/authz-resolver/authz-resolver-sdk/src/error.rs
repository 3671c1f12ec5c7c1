use crate::operation::AuthorizableOperation;

/// Errors produced while building, deciding or enforcing an authorization request.
///
/// `Unavailable` and `MalformedResponse` are infrastructure failures and must be
/// reported separately from `Denied`, which is an expected policy outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// An empty or otherwise unusable resource path reached the encoder.
    #[error("malformed resource hierarchy: {0}")]
    MalformedHierarchy(String),

    /// The policy engine could not be reached or answered with a non-success status.
    #[error("policy engine unavailable: {0}")]
    Unavailable(String),

    /// The policy engine answered, but without a boolean `result.allow`.
    #[error("policy engine returned a malformed response: {0}")]
    MalformedResponse(String),

    /// The policy explicitly denied the request.
    #[error("principal '{principal}' is not authorized for op {operation} on {resource}")]
    Denied {
        principal: String,
        operation: AuthorizableOperation,
        resource: String,
    },
}

impl AuthzError {
    /// `true` for failures of the policy engine itself rather than policy outcomes.
    #[must_use]
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::MalformedResponse(_))
    }

    #[must_use]
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied { .. })
    }
}
