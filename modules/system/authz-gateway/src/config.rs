//! Gateway configuration: a YAML file overlaid by `CATALOG_AUTHZ__*` environment variables.

use std::path::Path;

use anyhow::{Context, bail};
use authn_resolver::{
    AuthenticationConfig, AuthorizationConfig, ClaimsMappingConfig, StaticIdentityStoreConfig,
};
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use opa_authz_plugin::OpaAuthzPluginConfig;
use serde::Deserialize;

/// Environment prefix; nested keys are separated by `__`,
/// e.g. `CATALOG_AUTHZ__OPA__POLICY_URI`.
pub const ENV_PREFIX: &str = "CATALOG_AUTHZ__";

/// What to do when the policy engine cannot produce a decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineUnavailablePolicy {
    /// Fail closed: the engine error is returned to the caller.
    #[default]
    Deny,
    /// Fail open: the request proceeds and a warning is logged.
    Allow,
}

/// Gateway configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    pub authorization: AuthorizationConfig,
    pub authentication: AuthenticationConfig,
    /// Claim names used when credentials are built from token claims.
    pub claims: ClaimsMappingConfig,
    /// Trusted principals for internal principal mode.
    pub identity_store: StaticIdentityStoreConfig,
    pub opa: OpaAuthzPluginConfig,
    pub on_engine_unavailable: EngineUnavailablePolicy,
}

impl GatewayConfig {
    /// Load from `path` (if given) and the environment; environment wins.
    ///
    /// # Errors
    ///
    /// Fails if `path` does not exist or the merged values do not deserialize.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            if !path.is_file() {
                bail!("configuration file '{}' not found", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        figment
            .extract()
            .context("failed to load authorization gateway configuration")
    }
}
