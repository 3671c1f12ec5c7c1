use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How principals are established for a deployment.
///
/// Read once at startup and never changed for the lifetime of the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalMode {
    /// Principals are looked up in the trusted identity store.
    #[default]
    Internal,
    /// Principals are synthesized from externally asserted claims.
    External,
}

impl PrincipalMode {
    /// Configuration spelling of the mode (`internal` / `external`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::External => "external",
        }
    }

    #[must_use]
    pub const fn is_external(self) -> bool {
        matches!(self, Self::External)
    }
}

impl fmt::Display for PrincipalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown principal mode '{0}', expected 'internal' or 'external'")]
pub struct ParsePrincipalModeError(pub String);

impl FromStr for PrincipalMode {
    type Err = ParsePrincipalModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "internal" => Ok(Self::Internal),
            "external" => Ok(Self::External),
            _ => Err(ParsePrincipalModeError(s.to_owned())),
        }
    }
}
