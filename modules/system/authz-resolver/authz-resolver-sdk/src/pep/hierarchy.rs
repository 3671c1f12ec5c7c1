//! Resource hierarchy encoding.

use crate::error::AuthzError;
use crate::models::{EncodedNode, ParentRef, ResolvedPath};

/// Rendered in place of a resource identifier when no target was supplied.
pub const ROOT_RESOURCE_ID: &str = "<root>";

/// Encode the leaf of `path` with its ancestors reduced to `{type, name}`, root first.
///
/// # Errors
///
/// Returns [`AuthzError::MalformedHierarchy`] if the path is empty.
pub fn encode_path(path: &ResolvedPath) -> Result<EncodedNode, AuthzError> {
    let Some(leaf) = path.leaf() else {
        return Err(AuthzError::MalformedHierarchy(
            "resolved path is empty".to_owned(),
        ));
    };

    let parents = path
        .ancestors()
        .iter()
        .map(|entity| ParentRef {
            entity_type: entity.entity_type,
            name: entity.name.clone(),
        })
        .collect();

    Ok(EncodedNode {
        entity_type: leaf.entity_type,
        name: leaf.name.clone(),
        parents,
    })
}

/// Encode every path, preserving caller order.
///
/// # Errors
///
/// Returns [`AuthzError::MalformedHierarchy`] naming the position of the first empty path.
pub fn encode_paths(paths: &[ResolvedPath]) -> Result<Vec<EncodedNode>, AuthzError> {
    paths
        .iter()
        .enumerate()
        .map(|(idx, path)| {
            encode_path(path).map_err(|_| {
                AuthzError::MalformedHierarchy(format!("resolved path at index {idx} is empty"))
            })
        })
        .collect()
}

/// Dotted rendering of the targets for audit output, e.g. `cat.ns.table`.
///
/// Multiple targets are joined with `,`; an empty slice renders as `<root>`.
#[must_use]
pub fn compact_resource_id(targets: &[ResolvedPath]) -> String {
    if targets.is_empty() {
        return ROOT_RESOURCE_ID.to_owned();
    }

    targets
        .iter()
        .map(|path| {
            path.entities()
                .iter()
                .map(|entity| entity.name.as_str())
                .collect::<Vec<_>>()
                .join(".")
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::{EntityType, ResolvedEntity};

    fn orders_path() -> ResolvedPath {
        ResolvedPath::from(vec![
            ResolvedEntity::new(EntityType::Catalog, "prod_catalog", 100),
            ResolvedEntity::new(EntityType::Namespace, "sales_data", 200)
                .with_catalog_id(100)
                .with_parent_id(100),
            ResolvedEntity::new(EntityType::TableLike, "customer_orders", 300)
                .with_catalog_id(100)
                .with_parent_id(200),
        ])
    }

    #[test]
    fn parents_are_ancestors_root_first() {
        let node = encode_path(&orders_path()).unwrap();

        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({
                "type": "TABLE_LIKE",
                "name": "customer_orders",
                "parents": [
                    { "type": "CATALOG", "name": "prod_catalog" },
                    { "type": "NAMESPACE", "name": "sales_data" },
                ],
            })
        );
    }

    #[test]
    fn parent_count_is_path_length_minus_one() {
        let entities = orders_path().entities().to_vec();
        for n in 1..=entities.len() {
            let path: ResolvedPath = entities.iter().take(n).cloned().collect();
            let node = encode_path(&path).unwrap();
            assert_eq!(node.parents.len(), n - 1);
            assert_eq!(node.name, entities[n - 1].name);
        }
    }

    #[test]
    fn single_entity_has_empty_parents_array() {
        let path = ResolvedPath::from(vec![ResolvedEntity::new(
            EntityType::Catalog,
            "prod_catalog",
            100,
        )]);
        let value = serde_json::to_value(encode_path(&path).unwrap()).unwrap();
        assert_eq!(value["parents"], json!([]));
    }

    #[test]
    fn empty_path_is_malformed() {
        let err = encode_path(&ResolvedPath::default()).unwrap_err();
        assert!(matches!(err, AuthzError::MalformedHierarchy(_)));

        let err = encode_paths(&[orders_path(), ResolvedPath::default()]).unwrap_err();
        assert_eq!(
            err,
            AuthzError::MalformedHierarchy("resolved path at index 1 is empty".to_owned())
        );
    }

    #[test]
    fn compact_id_renders_dotted_paths() {
        assert_eq!(
            compact_resource_id(&[orders_path()]),
            "prod_catalog.sales_data.customer_orders"
        );

        let catalog = ResolvedPath::from(vec![ResolvedEntity::new(
            EntityType::Catalog,
            "dev_catalog",
            1,
        )]);
        assert_eq!(
            compact_resource_id(&[orders_path(), catalog]),
            "prod_catalog.sales_data.customer_orders,dev_catalog"
        );
        assert_eq!(compact_resource_id(&[]), "<root>");
    }
}
