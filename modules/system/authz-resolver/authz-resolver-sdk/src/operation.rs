//! Catalog operations subject to authorization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! authorizable_operations {
    ($($variant:ident => $tag:literal),+ $(,)?) => {
        /// An operation a principal may request against the catalog.
        ///
        /// Serialized (and sent to the policy engine) as its canonical
        /// uppercase tag, e.g. `LOAD_TABLE`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum AuthorizableOperation {
            $(
                #[serde(rename = $tag)]
                $variant,
            )+
        }

        impl AuthorizableOperation {
            /// Every known operation, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Canonical uppercase tag.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $tag,)+
                }
            }
        }

        impl FromStr for AuthorizableOperation {
            type Err = UnknownOperationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($tag => Ok(Self::$variant),)+
                    other => Err(UnknownOperationError(other.to_owned())),
                }
            }
        }
    };
}

authorizable_operations! {
    ListCatalogs => "LIST_CATALOGS",
    CreateCatalog => "CREATE_CATALOG",
    DeleteCatalog => "DELETE_CATALOG",
    GetCatalog => "GET_CATALOG",
    UpdateCatalog => "UPDATE_CATALOG",
    ListPrincipals => "LIST_PRINCIPALS",
    CreatePrincipal => "CREATE_PRINCIPAL",
    DeletePrincipal => "DELETE_PRINCIPAL",
    GetPrincipal => "GET_PRINCIPAL",
    UpdatePrincipal => "UPDATE_PRINCIPAL",
    RotateCredentials => "ROTATE_CREDENTIALS",
    ResetCredentials => "RESET_CREDENTIALS",
    ListPrincipalRoles => "LIST_PRINCIPAL_ROLES",
    CreatePrincipalRole => "CREATE_PRINCIPAL_ROLE",
    DeletePrincipalRole => "DELETE_PRINCIPAL_ROLE",
    GetPrincipalRole => "GET_PRINCIPAL_ROLE",
    UpdatePrincipalRole => "UPDATE_PRINCIPAL_ROLE",
    AssignPrincipalRole => "ASSIGN_PRINCIPAL_ROLE",
    RevokePrincipalRole => "REVOKE_PRINCIPAL_ROLE",
    ListCatalogRoles => "LIST_CATALOG_ROLES",
    CreateCatalogRole => "CREATE_CATALOG_ROLE",
    DeleteCatalogRole => "DELETE_CATALOG_ROLE",
    GetCatalogRole => "GET_CATALOG_ROLE",
    UpdateCatalogRole => "UPDATE_CATALOG_ROLE",
    AssignCatalogRoleToPrincipalRole => "ASSIGN_CATALOG_ROLE_TO_PRINCIPAL_ROLE",
    RevokeCatalogRoleFromPrincipalRole => "REVOKE_CATALOG_ROLE_FROM_PRINCIPAL_ROLE",
    ListNamespaces => "LIST_NAMESPACES",
    CreateNamespace => "CREATE_NAMESPACE",
    LoadNamespaceMetadata => "LOAD_NAMESPACE_METADATA",
    NamespaceExists => "NAMESPACE_EXISTS",
    DropNamespace => "DROP_NAMESPACE",
    UpdateNamespaceProperties => "UPDATE_NAMESPACE_PROPERTIES",
    ListTables => "LIST_TABLES",
    CreateTableDirect => "CREATE_TABLE_DIRECT",
    CreateTableStaged => "CREATE_TABLE_STAGED",
    RegisterTable => "REGISTER_TABLE",
    LoadTable => "LOAD_TABLE",
    LoadTableWithReadDelegation => "LOAD_TABLE_WITH_READ_DELEGATION",
    LoadTableWithWriteDelegation => "LOAD_TABLE_WITH_WRITE_DELEGATION",
    UpdateTable => "UPDATE_TABLE",
    DropTableWithoutPurge => "DROP_TABLE_WITHOUT_PURGE",
    DropTableWithPurge => "DROP_TABLE_WITH_PURGE",
    TableExists => "TABLE_EXISTS",
    RenameTable => "RENAME_TABLE",
    CommitTransaction => "COMMIT_TRANSACTION",
    ReportMetrics => "REPORT_METRICS",
    SendNotifications => "SEND_NOTIFICATIONS",
    ListViews => "LIST_VIEWS",
    CreateView => "CREATE_VIEW",
    LoadView => "LOAD_VIEW",
    ReplaceView => "REPLACE_VIEW",
    DropView => "DROP_VIEW",
    ViewExists => "VIEW_EXISTS",
    RenameView => "RENAME_VIEW",
    ListGrantsForCatalogRole => "LIST_GRANTS_FOR_CATALOG_ROLE",
    AddGrant => "ADD_GRANT",
    RevokeGrant => "REVOKE_GRANT",
}

impl fmt::Display for AuthorizableOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown authorizable operation '{0}'")]
pub struct UnknownOperationError(pub String);

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn tags_are_uppercase_snake_case() {
        for op in AuthorizableOperation::ALL {
            let tag = op.as_str();
            assert!(
                tag.chars().all(|c| c.is_ascii_uppercase() || c == '_'),
                "bad tag {tag}"
            );
        }
    }

    #[test]
    fn serde_and_display_agree_with_tag() {
        let op = AuthorizableOperation::LoadTable;
        assert_eq!(op.to_string(), "LOAD_TABLE");
        assert_eq!(serde_json::to_value(op).unwrap(), "LOAD_TABLE");
        assert_eq!("LOAD_TABLE".parse::<AuthorizableOperation>(), Ok(op));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = "load_table".parse::<AuthorizableOperation>().unwrap_err();
        assert_eq!(err.0, "load_table");
    }
}
