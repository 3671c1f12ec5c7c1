//! Principal resolution from an authenticated credential.

use std::sync::Arc;

use catalog_security::{Credential, Principal, PrincipalMode};
use tracing::{debug, warn};

use super::store::{IdentityStore, PrincipalLookup};
use crate::error::AuthnError;

/// Attribute carrying the numeric principal id on externally asserted principals.
pub const PRINCIPAL_ID_ATTRIBUTE: &str = "principal_id";

/// Turns credentials into principals according to the deployment's principal mode.
///
/// The branch is chosen by `mode` alone. In external mode the identity store
/// is never consulted.
#[derive(Clone)]
pub struct Authenticator {
    mode: PrincipalMode,
    store: Arc<dyn IdentityStore>,
}

impl Authenticator {
    pub fn new(mode: PrincipalMode, store: Arc<dyn IdentityStore>) -> Self {
        Self { mode, store }
    }

    #[must_use]
    pub fn mode(&self) -> PrincipalMode {
        self.mode
    }

    /// Resolve `credential` to a principal.
    ///
    /// # Errors
    ///
    /// - [`AuthnError::MissingPrincipalIdentity`] if the credential has neither id nor name
    /// - [`AuthnError::NotAuthorized`] if the identity store does not know the principal
    /// - [`AuthnError::IdentityStoreUnavailable`] if the store cannot be queried
    pub async fn authenticate(&self, credential: &Credential) -> Result<Principal, AuthnError> {
        if credential.is_external() != self.mode.is_external() {
            debug!(
                principal_mode = %self.mode,
                external = credential.is_external(),
                "credential origin differs from principal mode"
            );
        }

        match self.mode {
            PrincipalMode::Internal => self.resolve_from_store(credential).await,
            PrincipalMode::External => synthesize_external(credential),
        }
    }

    async fn resolve_from_store(&self, credential: &Credential) -> Result<Principal, AuthnError> {
        let lookup = match (credential.principal_id(), credential.principal_name()) {
            (Some(id), _) => PrincipalLookup::Id(id),
            (None, Some(name)) => PrincipalLookup::Name(name.to_owned()),
            (None, None) => return Err(AuthnError::MissingPrincipalIdentity),
        };

        match self.store.find_principal(&lookup).await {
            Ok(Some(principal)) => Ok(principal),
            Ok(None) => {
                debug!(lookup = %lookup, "principal not found in identity store");
                Err(AuthnError::NotAuthorized(format!(
                    "unable to fetch principal entity for {lookup}"
                )))
            }
            Err(e) => {
                warn!(lookup = %lookup, error = %e, "identity store lookup failed");
                Err(e.into())
            }
        }
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// Build a principal straight from the credential's claims.
fn synthesize_external(credential: &Credential) -> Result<Principal, AuthnError> {
    let name = match (credential.principal_name(), credential.principal_id()) {
        (Some(name), _) => name.to_owned(),
        (None, Some(id)) => id.to_string(),
        (None, None) => return Err(AuthnError::MissingPrincipalIdentity),
    };

    let mut principal = Principal::new(name).with_roles(credential.roles().iter().cloned());
    if let Some(id) = credential.principal_id() {
        principal = principal.with_attribute(PRINCIPAL_ID_ATTRIBUTE, id.to_string());
    }
    Ok(principal)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tracing_test::traced_test;

    use super::*;
    use crate::domain::store::StaticIdentityStore;
    use crate::error::IdentityStoreError;

    /// Store that counts lookups and knows nobody.
    #[derive(Default)]
    struct CountingStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl IdentityStore for CountingStore {
        async fn find_principal(
            &self,
            _lookup: &PrincipalLookup,
        ) -> Result<Option<Principal>, IdentityStoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }
    }

    struct DownStore;

    #[async_trait]
    impl IdentityStore for DownStore {
        async fn find_principal(
            &self,
            _lookup: &PrincipalLookup,
        ) -> Result<Option<Principal>, IdentityStoreError> {
            Err(IdentityStoreError::Unavailable("connection reset".to_owned()))
        }
    }

    fn external_with(store: &Arc<CountingStore>) -> Authenticator {
        Authenticator::new(PrincipalMode::External, store.clone())
    }

    #[tokio::test]
    async fn external_mode_uses_name_claim() {
        let store = Arc::new(CountingStore::default());
        let credential = Credential::builder()
            .principal_name("bob")
            .roles(["reader"])
            .external(true)
            .build();

        let principal = external_with(&store).authenticate(&credential).await.unwrap();

        assert_eq!(principal.name(), "bob");
        assert!(principal.has_role("reader"));
        assert!(principal.attributes().is_empty());
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn external_mode_falls_back_to_id() {
        let store = Arc::new(CountingStore::default());
        let credential = Credential::builder().principal_id(99).external(true).build();

        let principal = external_with(&store).authenticate(&credential).await.unwrap();

        assert_eq!(principal.name(), "99");
        assert!(principal.roles().is_empty());
        assert_eq!(
            principal.attributes().get(PRINCIPAL_ID_ATTRIBUTE).map(String::as_str),
            Some("99")
        );
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn external_mode_without_identity_is_not_authorized() {
        let store = Arc::new(CountingStore::default());
        let credential = Credential::builder().roles(["admin"]).external(true).build();

        let err = external_with(&store).authenticate(&credential).await.unwrap_err();

        assert_eq!(err, AuthnError::MissingPrincipalIdentity);
        assert!(err.is_not_authorized());
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn internal_mode_resolves_through_store() {
        let mut store = StaticIdentityStore::default();
        store.insert(Some(7), Principal::new("alice").with_role("catalog_admin"));
        let auth = Authenticator::new(PrincipalMode::Internal, Arc::new(store));

        let by_id = Credential::builder().principal_id(7).role("ignored").build();
        let principal = auth.authenticate(&by_id).await.unwrap();
        assert_eq!(principal.name(), "alice");
        assert!(principal.has_role("catalog_admin"));
        assert!(!principal.has_role("ignored"));

        let by_name = Credential::builder().principal_name("alice").build();
        assert_eq!(auth.authenticate(&by_name).await.unwrap().name(), "alice");
    }

    #[tokio::test]
    async fn internal_mode_lookup_miss_is_not_authorized() {
        let store = Arc::new(CountingStore::default());
        let auth = Authenticator::new(PrincipalMode::Internal, store.clone());

        let err = auth
            .authenticate(&Credential::builder().principal_name("bob").build())
            .await
            .unwrap_err();

        assert!(matches!(err, AuthnError::NotAuthorized(ref msg) if msg.contains("'bob'")));
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn internal_mode_never_synthesizes_from_claims() {
        let store = Arc::new(CountingStore::default());
        let auth = Authenticator::new(PrincipalMode::Internal, store.clone());
        let credential = Credential::builder()
            .principal_name("bob")
            .external(true)
            .build();

        let err = auth.authenticate(&credential).await.unwrap_err();
        assert!(err.is_not_authorized());

        let err = auth
            .authenticate(&Credential::builder().build())
            .await
            .unwrap_err();
        assert_eq!(err, AuthnError::MissingPrincipalIdentity);
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn store_outage_is_reported_separately() {
        let auth = Authenticator::new(PrincipalMode::Internal, Arc::new(DownStore));

        let err = auth
            .authenticate(&Credential::builder().principal_id(1).build())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            AuthnError::IdentityStoreUnavailable("connection reset".to_owned())
        );
        assert!(logs_contain("identity store lookup failed"));
    }
}
