//! Authentication and authorization settings consumed by principal resolution.

use std::collections::BTreeMap;
use std::fmt;

use catalog_security::PrincipalMode;
use serde::Deserialize;

/// Realm whose settings apply when no realm is named.
pub const DEFAULT_REALM_KEY: &str = "default-realm";

/// Authorization settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthorizationConfig {
    /// Where principals come from: the trusted store or external claims.
    pub principal_mode: PrincipalMode,
}

/// How a realm authenticates callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationType {
    /// Tokens issued by the service itself.
    #[default]
    Internal,
    /// Tokens issued by an external identity provider.
    External,
    /// Both of the above.
    Mixed,
}

impl AuthenticationType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::External => "external",
            Self::Mixed => "mixed",
        }
    }

    /// `true` if externally issued tokens are accepted.
    #[must_use]
    pub const fn accepts_external(self) -> bool {
        matches!(self, Self::External | Self::Mixed)
    }
}

impl fmt::Display for AuthenticationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-realm authentication settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthenticationRealmConfig {
    #[serde(rename = "type")]
    pub auth_type: AuthenticationType,
}

/// Authentication settings for all realms.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthenticationConfig {
    /// Realm checked by startup validation.
    pub default_realm: String,

    /// Settings keyed by realm name.
    pub realms: BTreeMap<String, AuthenticationRealmConfig>,
}

impl Default for AuthenticationConfig {
    fn default() -> Self {
        Self {
            default_realm: DEFAULT_REALM_KEY.to_owned(),
            realms: BTreeMap::new(),
        }
    }
}

impl AuthenticationConfig {
    /// Settings for `realm`, or the defaults if the realm has no entry.
    #[must_use]
    pub fn for_realm(&self, realm: &str) -> AuthenticationRealmConfig {
        self.realms.get(realm).cloned().unwrap_or_default()
    }

    /// Configuration with a single default realm of the given type.
    #[must_use]
    pub fn single_realm(auth_type: AuthenticationType) -> Self {
        let mut realms = BTreeMap::new();
        realms.insert(
            DEFAULT_REALM_KEY.to_owned(),
            AuthenticationRealmConfig { auth_type },
        );
        Self {
            default_realm: DEFAULT_REALM_KEY.to_owned(),
            realms,
        }
    }
}
