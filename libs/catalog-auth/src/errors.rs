/// Failure to obtain a bearer credential for the policy engine.
///
/// `Clone` so a single failed refresh can be handed to every caller that was
/// waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token endpoint unreachable: {0}")]
    Transport(String),

    #[error("token endpoint returned HTTP {status}")]
    Status { status: u16 },

    #[error("invalid token response: {0}")]
    InvalidResponse(String),

    #[error("invalid token provider configuration: {0}")]
    Config(String),
}
