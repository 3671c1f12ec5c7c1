//! Startup check that principal mode and authentication type agree.

use catalog_security::PrincipalMode;

use crate::config::{AuthenticationConfig, AuthorizationConfig, DEFAULT_REALM_KEY};
use crate::error::ConfigError;

/// Fail fast when external principals are configured for a realm that only
/// authenticates internally issued tokens.
///
/// Internal principal mode accepts every authentication type. In external
/// mode the default realm must be `external` or `mixed`; a realm name other
/// than `default-realm` must also have an entry.
///
/// # Errors
///
/// - [`ConfigError::IncompatiblePrincipalMode`] for external mode over an internal realm
/// - [`ConfigError::UnknownRealm`] if a custom default realm has no entry
pub fn validate_principal_mode(
    authorization: &AuthorizationConfig,
    authentication: &AuthenticationConfig,
) -> Result<(), ConfigError> {
    if authorization.principal_mode != PrincipalMode::External {
        return Ok(());
    }

    let realm = authentication.default_realm.as_str();
    if realm != DEFAULT_REALM_KEY && !authentication.realms.contains_key(realm) {
        let err = ConfigError::UnknownRealm(realm.to_owned());
        tracing::error!(error = %err, "principal mode validation failed");
        return Err(err);
    }

    let found = authentication.for_realm(realm).auth_type;
    if found.accepts_external() {
        return Ok(());
    }

    let err = ConfigError::IncompatiblePrincipalMode {
        realm: realm.to_owned(),
        found,
    };
    tracing::error!(error = %err, "principal mode validation failed");
    Err(err)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::config::AuthenticationType;

    fn authz(mode: PrincipalMode) -> AuthorizationConfig {
        AuthorizationConfig {
            principal_mode: mode,
        }
    }

    #[test]
    #[traced_test]
    fn external_over_internal_realm_fails() {
        let err = validate_principal_mode(
            &authz(PrincipalMode::External),
            &AuthenticationConfig::single_realm(AuthenticationType::Internal),
        )
        .unwrap_err();

        assert!(err.to_string().contains("principal-mode=external"));
        assert!(logs_contain("principal mode validation failed"));
    }

    #[test]
    fn external_without_realm_entry_is_treated_as_internal() {
        let err = validate_principal_mode(
            &authz(PrincipalMode::External),
            &AuthenticationConfig::default(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::IncompatiblePrincipalMode {
                found: AuthenticationType::Internal,
                ..
            }
        ));
    }

    #[test]
    fn external_accepts_external_and_mixed() {
        for auth_type in [AuthenticationType::External, AuthenticationType::Mixed] {
            validate_principal_mode(
                &authz(PrincipalMode::External),
                &AuthenticationConfig::single_realm(auth_type),
            )
            .unwrap();
        }
    }

    #[test]
    fn internal_accepts_any_authentication_type() {
        for auth_type in [
            AuthenticationType::Internal,
            AuthenticationType::External,
            AuthenticationType::Mixed,
        ] {
            validate_principal_mode(
                &authz(PrincipalMode::Internal),
                &AuthenticationConfig::single_realm(auth_type),
            )
            .unwrap();
        }

        let dangling = AuthenticationConfig {
            default_realm: "missing".to_owned(),
            ..AuthenticationConfig::default()
        };
        validate_principal_mode(&authz(PrincipalMode::Internal), &dangling).unwrap();
    }

    #[test]
    fn external_with_unknown_custom_realm_fails() {
        let authn = AuthenticationConfig {
            default_realm: "partners".to_owned(),
            ..AuthenticationConfig::single_realm(AuthenticationType::External)
        };

        let err = validate_principal_mode(&authz(PrincipalMode::External), &authn).unwrap_err();
        assert_eq!(err, ConfigError::UnknownRealm("partners".to_owned()));
    }
}
