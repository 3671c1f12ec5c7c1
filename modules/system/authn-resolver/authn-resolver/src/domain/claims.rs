//! Mapping of verified token claims to a [`Credential`].
//!
//! Claims arrive already decoded and verified by the host; nothing here
//! inspects signatures.

use std::collections::BTreeSet;

use catalog_security::{Credential, CredentialFactory, PrincipalMode};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ConfigError;

/// Claim paths use `/` to descend into nested objects, e.g. `realm_access/roles`.
const CLAIM_PATH_SEPARATOR: char = '/';

/// Which claims carry the principal identity and roles.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClaimsMappingConfig {
    /// Numeric principal id, as a number or a numeric string.
    pub id_claim: String,

    /// Principal name; the id rendered as text when absent.
    pub name_claim: String,

    /// Array of role names.
    pub roles_claim: String,

    /// Keep only roles matching this pattern in full.
    pub role_filter: Option<String>,
}

impl Default for ClaimsMappingConfig {
    fn default() -> Self {
        Self {
            id_claim: "sub".to_owned(),
            name_claim: "preferred_username".to_owned(),
            roles_claim: "roles".to_owned(),
            role_filter: None,
        }
    }
}

/// Builds credentials from externally asserted claims.
#[derive(Debug, Clone)]
pub struct ClaimsCredentialMapper {
    config: ClaimsMappingConfig,
    role_filter: Option<Regex>,
    factory: CredentialFactory,
}

impl ClaimsCredentialMapper {
    /// Create a mapper whose credentials are tagged for `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidClaimsMapping`] if `role_filter` is not a valid regex.
    pub fn new(config: ClaimsMappingConfig, mode: PrincipalMode) -> Result<Self, ConfigError> {
        let role_filter = config
            .role_filter
            .as_deref()
            .map(|pattern| Regex::new(&format!("^(?:{pattern})$")))
            .transpose()
            .map_err(|e| ConfigError::InvalidClaimsMapping(format!("role_filter: {e}")))?;

        Ok(Self {
            config,
            role_filter,
            factory: CredentialFactory::new(mode),
        })
    }

    /// Map `claims` to a credential.
    ///
    /// Missing identity claims are not an error here; the resulting
    /// credential simply has no identity and fails principal resolution.
    #[must_use]
    pub fn map(&self, claims: &Value) -> Credential {
        let principal_id = claim(claims, &self.config.id_claim).and_then(as_principal_id);
        let principal_name = claim(claims, &self.config.name_claim)
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
            .map(ToOwned::to_owned)
            .or_else(|| principal_id.map(|id| id.to_string()));

        self.factory
            .create(principal_id, principal_name, self.roles(claims))
    }

    fn roles(&self, claims: &Value) -> BTreeSet<String> {
        let Some(Value::Array(values)) = claim(claims, &self.config.roles_claim) else {
            return BTreeSet::new();
        };
        values
            .iter()
            .filter_map(Value::as_str)
            .filter(|role| self.role_filter.as_ref().is_none_or(|re| re.is_match(role)))
            .map(ToOwned::to_owned)
            .collect()
    }
}

fn claim<'a>(claims: &'a Value, path: &str) -> Option<&'a Value> {
    path.split(CLAIM_PATH_SEPARATOR)
        .try_fold(claims, |value, segment| value.get(segment))
}

fn as_principal_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
