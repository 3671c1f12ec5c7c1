//! Trusted identity store seam and a configuration-backed implementation.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use async_trait::async_trait;
use catalog_security::Principal;
use serde::Deserialize;

use crate::error::IdentityStoreError;

/// Key used to look a principal up in the trusted store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrincipalLookup {
    Id(i64),
    Name(String),
}

impl fmt::Display for PrincipalLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::Name(name) => write!(f, "name '{name}'"),
        }
    }
}

/// Trusted source of principals for internal principal mode.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Find a principal; `Ok(None)` means the identity is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityStoreError`] if the store cannot be queried.
    async fn find_principal(
        &self,
        lookup: &PrincipalLookup,
    ) -> Result<Option<Principal>, IdentityStoreError>;
}

/// A principal entry in [`StaticIdentityStoreConfig`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticPrincipalConfig {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// Principals served by [`StaticIdentityStore`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticIdentityStoreConfig {
    pub principals: Vec<StaticPrincipalConfig>,
}

/// In-memory identity store built from configuration.
#[derive(Debug, Default)]
pub struct StaticIdentityStore {
    by_name: HashMap<String, Principal>,
    names_by_id: HashMap<i64, String>,
}

impl StaticIdentityStore {
    #[must_use]
    pub fn from_config(cfg: &StaticIdentityStoreConfig) -> Self {
        let mut store = Self::default();
        for entry in &cfg.principals {
            let principal = Principal::new(entry.name.clone())
                .with_roles(entry.roles.iter().cloned())
                .with_attributes(entry.attributes.clone());
            store.insert(entry.id, principal);
        }
        store
    }

    /// Add or replace a principal, optionally reachable by numeric id.
    ///
    /// Replacing a principal drops the ids previously mapped to its name.
    pub fn insert(&mut self, id: Option<i64>, principal: Principal) {
        let name = principal.name().to_owned();
        self.names_by_id.retain(|_, mapped| *mapped != name);
        if let Some(id) = id {
            self.names_by_id.insert(id, name.clone());
        }
        self.by_name.insert(name, principal);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[async_trait]
impl IdentityStore for StaticIdentityStore {
    async fn find_principal(
        &self,
        lookup: &PrincipalLookup,
    ) -> Result<Option<Principal>, IdentityStoreError> {
        let name = match lookup {
            PrincipalLookup::Id(id) => self.names_by_id.get(id).map(String::as_str),
            PrincipalLookup::Name(name) => Some(name.as_str()),
        };
        Ok(name.and_then(|n| self.by_name.get(n)).cloned())
    }
}
