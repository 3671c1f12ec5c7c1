//! Catalog Authorization Gateway
//!
//! Wires configuration, principal resolution and the OPA decision client into
//! a single [`AuthzGateway::authorize`] call:
//!
//! ```ignore
//! let cfg = GatewayConfig::load(Some(Path::new("config/authz.yaml")))?;
//! let gateway = AuthzGateway::from_config(&cfg)?;
//!
//! let credential = gateway.credential_from_claims(&verified_claims);
//! let principal = gateway
//!     .authorize(&credential, AuthorizableOperation::LoadTable, &AccessRequest::new().target(path))
//!     .await?;
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod error;
pub mod gateway;

pub use config::{ENV_PREFIX, EngineUnavailablePolicy, GatewayConfig};
pub use error::GatewayError;
pub use gateway::AuthzGateway;
