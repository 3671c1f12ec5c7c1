//! Identity claims as produced by the host authentication layer.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::principal_mode::PrincipalMode;

/// Raw identity claims prior to principal resolution.
///
/// At least one of `principal_id` / `principal_name` must be present for the
/// credential to resolve; absence is an error, never an anonymous default.
/// `external` records where the claims came from, it is not part of the identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    principal_id: Option<i64>,
    principal_name: Option<String>,
    #[serde(default)]
    roles: BTreeSet<String>,
    #[serde(default)]
    external: bool,
}

impl Credential {
    #[must_use]
    pub fn builder() -> CredentialBuilder {
        CredentialBuilder::default()
    }

    #[inline]
    #[must_use]
    pub fn principal_id(&self) -> Option<i64> {
        self.principal_id
    }

    /// Principal name, ignoring blank values.
    #[must_use]
    pub fn principal_name(&self) -> Option<&str> {
        self.principal_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }

    #[inline]
    #[must_use]
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    #[inline]
    #[must_use]
    pub fn is_external(&self) -> bool {
        self.external
    }

    /// Whether the credential carries any identifier at all.
    #[must_use]
    pub fn has_identity(&self) -> bool {
        self.principal_id.is_some() || self.principal_name().is_some()
    }
}

/// Builder for [`Credential`].
#[derive(Debug, Default)]
pub struct CredentialBuilder {
    inner: Credential,
}

impl CredentialBuilder {
    #[must_use]
    pub fn principal_id(mut self, id: i64) -> Self {
        self.inner.principal_id = Some(id);
        self
    }

    #[must_use]
    pub fn principal_name(mut self, name: impl Into<String>) -> Self {
        self.inner.principal_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.inner.roles.insert(role.into());
        self
    }

    #[must_use]
    pub fn roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn external(mut self, external: bool) -> Self {
        self.inner.external = external;
        self
    }

    #[must_use]
    pub fn build(self) -> Credential {
        self.inner
    }
}

/// Creates credentials tagged with the deployment's principal mode.
///
/// Host authentication mechanisms call this once they have verified the
/// transport credential, so every credential they emit carries the right
/// origin tag without each mechanism reading configuration itself.
#[derive(Debug, Clone, Copy)]
pub struct CredentialFactory {
    mode: PrincipalMode,
}

impl CredentialFactory {
    #[must_use]
    pub fn new(mode: PrincipalMode) -> Self {
        Self { mode }
    }

    #[must_use]
    pub fn principal_mode(&self) -> PrincipalMode {
        self.mode
    }

    /// Build a credential; `external` is set iff the principal mode is external.
    #[must_use]
    pub fn create(
        &self,
        principal_id: Option<i64>,
        principal_name: Option<String>,
        roles: BTreeSet<String>,
    ) -> Credential {
        Credential {
            principal_id,
            principal_name,
            roles,
            external: self.mode.is_external(),
        }
    }
}
