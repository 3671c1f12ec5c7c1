//! PEP request builder.
//!
//! Assembles the [`AuthorizationInput`] document from a [`Principal`], the
//! requested operation and the resolved resource paths of an [`AccessRequest`].

use catalog_security::Principal;
use serde_json::{Map, Value};

use crate::error::AuthzError;
use crate::models::{Actor, AuthorizationInput, ResolvedPath, ResourceSet};
use crate::operation::AuthorizableOperation;
use crate::pep::hierarchy::encode_paths;

/// Resources and context of a single authorization request.
///
/// Targets are the entities the operation acts on; secondaries are entities it
/// only references (e.g. the source of a rename). Both keep insertion order.
///
/// # Examples
///
/// ```ignore
/// use authz_resolver_sdk::pep::AccessRequest;
///
/// let request = AccessRequest::new()
///     .target(table_path)
///     .secondary(source_namespace_path)
///     .context_value("request_id", json!("r-42"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct AccessRequest {
    targets: Vec<ResolvedPath>,
    secondaries: Vec<ResolvedPath>,
    context: Map<String, Value>,
}

impl AccessRequest {
    /// Create an empty request: no targets, no secondaries, empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a primary target.
    #[must_use]
    pub fn target(mut self, path: impl Into<ResolvedPath>) -> Self {
        self.targets.push(path.into());
        self
    }

    /// Append several primary targets.
    #[must_use]
    pub fn targets<I>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = ResolvedPath>,
    {
        self.targets.extend(paths);
        self
    }

    /// Append a secondary reference.
    #[must_use]
    pub fn secondary(mut self, path: impl Into<ResolvedPath>) -> Self {
        self.secondaries.push(path.into());
        self
    }

    #[must_use]
    pub fn secondaries<I>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = ResolvedPath>,
    {
        self.secondaries.extend(paths);
        self
    }

    /// Set a single context entry, replacing any previous value for `key`.
    #[must_use]
    pub fn context_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Replace the whole context mapping.
    #[must_use]
    pub fn context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    #[must_use]
    pub fn target_paths(&self) -> &[ResolvedPath] {
        &self.targets
    }

    #[must_use]
    pub fn secondary_paths(&self) -> &[ResolvedPath] {
        &self.secondaries
    }

    #[must_use]
    pub fn context_map(&self) -> &Map<String, Value> {
        &self.context
    }
}

/// Build the decision document for `principal` performing `operation`.
///
/// Pure transformation: `resource.targets` and `resource.secondaries` follow
/// the request order and are empty arrays when nothing was supplied.
///
/// # Errors
///
/// Returns [`AuthzError::MalformedHierarchy`] if any target or secondary path is empty.
pub fn build_authorization_input(
    principal: &Principal,
    operation: AuthorizableOperation,
    request: &AccessRequest,
) -> Result<AuthorizationInput, AuthzError> {
    let targets = encode_paths(&request.targets)?;
    let secondaries = encode_paths(&request.secondaries)?;

    Ok(AuthorizationInput {
        actor: Actor {
            principal: principal.name().to_owned(),
            roles: principal.roles().iter().cloned().collect(),
            attributes: principal.attributes().clone(),
        },
        action: operation,
        resource: ResourceSet {
            targets,
            secondaries,
        },
        context: request.context.clone(),
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::{EntityType, ResolvedEntity};

    fn catalog(name: &str) -> ResolvedPath {
        ResolvedPath::from(vec![ResolvedEntity::new(EntityType::Catalog, name, 1)])
    }

    #[test]
    fn builds_document_with_fixed_layout() {
        let principal = Principal::new("alice")
            .with_roles(["analyst"])
            .with_attribute("department", "analytics");
        let request = AccessRequest::new()
            .target(catalog("a"))
            .target(catalog("b"))
            .secondary(catalog("c"))
            .context_value("request_id", "r-1");

        let input =
            build_authorization_input(&principal, AuthorizableOperation::GetCatalog, &request)
                .unwrap();

        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            json!({
                "actor": {
                    "principal": "alice",
                    "roles": ["analyst"],
                    "attributes": { "department": "analytics" },
                },
                "action": "GET_CATALOG",
                "resource": {
                    "targets": [
                        { "type": "CATALOG", "name": "a", "parents": [] },
                        { "type": "CATALOG", "name": "b", "parents": [] },
                    ],
                    "secondaries": [
                        { "type": "CATALOG", "name": "c", "parents": [] },
                    ],
                },
                "context": { "request_id": "r-1" },
            })
        );
    }

    #[test]
    fn empty_collections_serialize_as_arrays() {
        let input = build_authorization_input(
            &Principal::new("root"),
            AuthorizableOperation::ListCatalogs,
            &AccessRequest::new(),
        )
        .unwrap();
        let value = serde_json::to_value(&input).unwrap();

        assert_eq!(value["resource"]["targets"], json!([]));
        assert_eq!(value["resource"]["secondaries"], json!([]));
        assert_eq!(value["actor"]["roles"], json!([]));
        assert_eq!(value["context"], json!({}));
    }

    #[test]
    fn empty_secondary_path_is_rejected() {
        let request = AccessRequest::new()
            .target(catalog("a"))
            .secondary(ResolvedPath::default());

        let err = build_authorization_input(
            &Principal::new("alice"),
            AuthorizableOperation::GetCatalog,
            &request,
        )
        .unwrap_err();
        assert!(matches!(err, AuthzError::MalformedHierarchy(_)));
    }
}
