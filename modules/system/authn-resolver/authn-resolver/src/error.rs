use crate::config::AuthenticationType;

/// Startup configuration errors. Fatal; never recovered at runtime.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "invalid configuration: authorization.principal-mode=external requires \
         authentication type of realm '{realm}' to be 'external' or 'mixed', found '{found}'"
    )]
    IncompatiblePrincipalMode {
        realm: String,
        found: AuthenticationType,
    },

    #[error("invalid configuration: authentication.default-realm '{0}' has no realm entry")]
    UnknownRealm(String),

    #[error("invalid configuration: claims mapping: {0}")]
    InvalidClaimsMapping(String),
}

/// Failure of the trusted identity store itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityStoreError {
    #[error("identity store unavailable: {0}")]
    Unavailable(String),
}

/// Principal resolution errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthnError {
    /// The credential carries neither a principal id nor a name.
    #[error("not authorized: credential carries no principal identity")]
    MissingPrincipalIdentity,

    /// The identity is unknown to the trusted store.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// The trusted store could not be queried; not a denial.
    #[error("identity store unavailable: {0}")]
    IdentityStoreUnavailable(String),
}

impl AuthnError {
    /// `true` for outcomes the caller must surface as "not authorized".
    #[must_use]
    pub fn is_not_authorized(&self) -> bool {
        matches!(self, Self::MissingPrincipalIdentity | Self::NotAuthorized(_))
    }
}

impl From<IdentityStoreError> for AuthnError {
    fn from(e: IdentityStoreError) -> Self {
        match e {
            IdentityStoreError::Unavailable(msg) => Self::IdentityStoreUnavailable(msg),
        }
    }
}
