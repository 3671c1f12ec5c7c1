//! Domain models for catalog authorization.
//!
//! The [`AuthorizationInput`] layout (`actor`, `action`, `resource.targets`,
//! `resource.secondaries`, `context`) is a contract with externally authored
//! policies: field names and array order are stable.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AuthzError;
use crate::operation::AuthorizableOperation;

/// Kind of catalog entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Root,
    Principal,
    PrincipalRole,
    Catalog,
    CatalogRole,
    Namespace,
    TableLike,
    Task,
    File,
    Policy,
}

impl EntityType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Root => "ROOT",
            Self::Principal => "PRINCIPAL",
            Self::PrincipalRole => "PRINCIPAL_ROLE",
            Self::Catalog => "CATALOG",
            Self::CatalogRole => "CATALOG_ROLE",
            Self::Namespace => "NAMESPACE",
            Self::TableLike => "TABLE_LIKE",
            Self::Task => "TASK",
            Self::File => "FILE",
            Self::Policy => "POLICY",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog entity as produced by the metadata resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEntity {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub name: String,
    pub id: i64,
    pub catalog_id: i64,
    pub parent_id: i64,
    /// Additional permission-relevant properties.
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl ResolvedEntity {
    #[must_use]
    pub fn new(entity_type: EntityType, name: impl Into<String>, id: i64) -> Self {
        Self {
            entity_type,
            name: name.into(),
            id,
            catalog_id: 0,
            parent_id: 0,
            properties: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_catalog_id(mut self, catalog_id: i64) -> Self {
        self.catalog_id = catalog_id;
        self
    }

    #[must_use]
    pub fn with_parent_id(mut self, parent_id: i64) -> Self {
        self.parent_id = parent_id;
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Root-to-leaf chain of resolved entities; the last element is the target.
///
/// Emptiness is not rejected here; the encoder reports it as
/// [`AuthzError::MalformedHierarchy`] so the resolver bug surfaces at decision time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedPath {
    entities: Vec<ResolvedEntity>,
}

impl ResolvedPath {
    #[must_use]
    pub fn new(entities: Vec<ResolvedEntity>) -> Self {
        Self { entities }
    }

    #[must_use]
    pub fn entities(&self) -> &[ResolvedEntity] {
        &self.entities
    }

    /// The target entity.
    #[must_use]
    pub fn leaf(&self) -> Option<&ResolvedEntity> {
        self.entities.last()
    }

    /// Ancestors of the target, root first.
    #[must_use]
    pub fn ancestors(&self) -> &[ResolvedEntity] {
        match self.entities.split_last() {
            Some((_, ancestors)) => ancestors,
            None => &[],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl From<Vec<ResolvedEntity>> for ResolvedPath {
    fn from(entities: Vec<ResolvedEntity>) -> Self {
        Self::new(entities)
    }
}

impl FromIterator<ResolvedEntity> for ResolvedPath {
    fn from_iter<I: IntoIterator<Item = ResolvedEntity>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// An ancestor reduced to its type and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub name: String,
}

/// A target entity together with its ancestor chain, root first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedNode {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub name: String,
    pub parents: Vec<ParentRef>,
}

/// The principal as seen by the policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub principal: String,
    /// Role order is unspecified; policies must not depend on it.
    pub roles: Vec<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// Primary targets and secondary references of a request.
///
/// Both always serialize as arrays, empty when nothing was supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSet {
    pub targets: Vec<EncodedNode>,
    pub secondaries: Vec<EncodedNode>,
}

/// Canonical decision request sent to the policy engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationInput {
    pub actor: Actor,
    pub action: AuthorizableOperation,
    pub resource: ResourceSet,
    #[serde(default)]
    pub context: Map<String, Value>,
}

/// Decision returned by the policy engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecisionResponse {
    pub allow: bool,
}

impl PolicyDecisionResponse {
    #[must_use]
    pub const fn allow() -> Self {
        Self { allow: true }
    }

    #[must_use]
    pub const fn deny() -> Self {
        Self { allow: false }
    }

    /// Extract the decision from a `{"result": {"allow": <bool>}, ...}` document.
    ///
    /// Any other fields are ignored. A missing or non-boolean `result.allow`
    /// is malformed, never an implicit deny.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::MalformedResponse`] if `result.allow` is absent or
    /// not a boolean.
    pub fn from_result_document(document: &Value) -> Result<Self, AuthzError> {
        let Some(result) = document.get("result") else {
            return Err(AuthzError::MalformedResponse(
                "response has no 'result' field".to_owned(),
            ));
        };
        match result.get("allow") {
            Some(Value::Bool(allow)) => Ok(Self { allow: *allow }),
            Some(other) => Err(AuthzError::MalformedResponse(format!(
                "'result.allow' is not a boolean: {other}"
            ))),
            None => Err(AuthzError::MalformedResponse(
                "response has no 'result.allow' field".to_owned(),
            )),
        }
    }
}
