use authn_resolver::AuthnError;
use authz_resolver_sdk::AuthzError;

/// Failure of a single gateway authorization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Authentication(#[from] AuthnError),

    #[error(transparent)]
    Authorization(#[from] AuthzError),
}

impl GatewayError {
    /// `true` when the caller should answer "not authorized" (unknown or
    /// missing identity, or an explicit policy denial).
    #[must_use]
    pub fn is_not_authorized(&self) -> bool {
        match self {
            Self::Authentication(e) => e.is_not_authorized(),
            Self::Authorization(e) => e.is_denied(),
        }
    }

    /// `true` for failures of the policy engine or the identity store.
    #[must_use]
    pub fn is_infrastructure(&self) -> bool {
        match self {
            Self::Authentication(e) => matches!(e, AuthnError::IdentityStoreUnavailable(_)),
            Self::Authorization(e) => e.is_infrastructure(),
        }
    }
}
