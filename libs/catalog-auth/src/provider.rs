use async_trait::async_trait;
use secrecy::SecretString;

use crate::errors::TokenError;

/// Supplies the bearer credential attached to policy engine requests.
///
/// Implementations may block briefly on first use or on refresh.
#[async_trait]
pub trait BearerTokenProvider: Send + Sync {
    /// Return a currently valid token.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] if no valid token can be produced.
    async fn token(&self) -> Result<SecretString, TokenError>;
}

/// Provider for a token fixed at construction time.
pub struct StaticBearerTokenProvider {
    token: SecretString,
}

impl StaticBearerTokenProvider {
    #[must_use]
    pub fn new(token: impl Into<SecretString>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticBearerTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticBearerTokenProvider")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl BearerTokenProvider for StaticBearerTokenProvider {
    async fn token(&self) -> Result<SecretString, TokenError> {
        Ok(self.token.clone())
    }
}
