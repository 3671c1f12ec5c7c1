//! End-to-end authorization: credential → principal → decision → enforcement.

use std::sync::Arc;

use anyhow::Context;
use authn_resolver::{
    Authenticator, ClaimsCredentialMapper, IdentityStore, StaticIdentityStore,
    validate_principal_mode,
};
use authz_resolver_sdk::pep::{AccessRequest, PolicyEnforcer};
use authz_resolver_sdk::{AuthorizableOperation, AuthzError, PolicyDecisionClient};
use catalog_security::{Credential, Principal};
use opa_authz_plugin::OpaPolicyDecisionClient;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::{EngineUnavailablePolicy, GatewayConfig};
use crate::error::GatewayError;

/// Authorization entry point for request handlers.
///
/// Constructed once at startup; cheap to clone.
#[derive(Clone)]
pub struct AuthzGateway {
    authenticator: Authenticator,
    claims: Arc<ClaimsCredentialMapper>,
    enforcer: PolicyEnforcer,
    on_engine_unavailable: EngineUnavailablePolicy,
}

impl AuthzGateway {
    /// Validate `cfg` and build the gateway with the configured static
    /// identity store and the OPA decision client.
    ///
    /// # Errors
    ///
    /// Fails if principal mode and authentication type are incompatible, or
    /// if the claims mapping or the OPA client cannot be built.
    #[tracing::instrument(skip_all, fields(principal_mode = %cfg.authorization.principal_mode))]
    pub fn from_config(cfg: &GatewayConfig) -> anyhow::Result<Self> {
        let store = Arc::new(StaticIdentityStore::from_config(&cfg.identity_store));
        Self::from_config_with_store(cfg, store)
    }

    /// Like [`Self::from_config`] but with a caller-supplied identity store.
    ///
    /// # Errors
    ///
    /// See [`Self::from_config`].
    pub fn from_config_with_store(
        cfg: &GatewayConfig,
        store: Arc<dyn IdentityStore>,
    ) -> anyhow::Result<Self> {
        validate_principal_mode(&cfg.authorization, &cfg.authentication)?;

        let client = OpaPolicyDecisionClient::from_config(&cfg.opa)
            .context("failed to build policy decision client")?;
        info!(
            policy_uri = %client.policy_uri(),
            on_engine_unavailable = ?cfg.on_engine_unavailable,
            "Initializing authorization gateway"
        );

        let claims = ClaimsCredentialMapper::new(
            cfg.claims.clone(),
            cfg.authorization.principal_mode,
        )?;

        Ok(Self::new(
            Authenticator::new(cfg.authorization.principal_mode, store),
            claims,
            Arc::new(client),
            cfg.on_engine_unavailable,
        ))
    }

    pub fn new(
        authenticator: Authenticator,
        claims: ClaimsCredentialMapper,
        decision_client: Arc<dyn PolicyDecisionClient>,
        on_engine_unavailable: EngineUnavailablePolicy,
    ) -> Self {
        Self {
            authenticator,
            claims: Arc::new(claims),
            enforcer: PolicyEnforcer::new(decision_client),
            on_engine_unavailable,
        }
    }

    /// Build a credential from claims the host has already verified.
    #[must_use]
    pub fn credential_from_claims(&self, claims: &Value) -> Credential {
        self.claims.map(claims)
    }

    /// Resolve the principal behind `credential` and authorize `operation` on
    /// the resources of `request`. Returns the principal on success.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Authentication`] if no principal can be resolved
    /// - [`GatewayError::Authorization`] on denial, malformed hierarchy, or an
    ///   engine failure under the `deny` unavailability policy
    #[tracing::instrument(skip_all, fields(operation = %operation))]
    pub async fn authorize(
        &self,
        credential: &Credential,
        operation: AuthorizableOperation,
        request: &AccessRequest,
    ) -> Result<Principal, GatewayError> {
        let principal = self.authenticator.authenticate(credential).await?;

        match self.enforcer.authorize(&principal, operation, request).await {
            Ok(()) => Ok(principal),
            Err(e) if e.is_infrastructure() => self.on_engine_failure(principal, e),
            Err(e) => Err(e.into()),
        }
    }

    fn on_engine_failure(
        &self,
        principal: Principal,
        error: AuthzError,
    ) -> Result<Principal, GatewayError> {
        match self.on_engine_unavailable {
            EngineUnavailablePolicy::Deny => {
                tracing::error!(
                    principal = %principal.name(),
                    error = %error,
                    "policy engine failure; request denied"
                );
                Err(error.into())
            }
            EngineUnavailablePolicy::Allow => {
                warn!(
                    principal = %principal.name(),
                    error = %error,
                    "policy engine failure; request allowed by fail-open policy"
                );
                Ok(principal)
            }
        }
    }
}

impl std::fmt::Debug for AuthzGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthzGateway")
            .field("principal_mode", &self.authenticator.mode())
            .field("on_engine_unavailable", &self.on_engine_unavailable)
            .finish_non_exhaustive()
    }
}
