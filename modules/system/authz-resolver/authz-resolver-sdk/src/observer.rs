//! Instrumentation hooks for decision traffic.

use serde_json::Value;

/// Observer notified with the exact JSON exchanged with the policy engine.
///
/// Registered on a decision client; both callbacks default to no-ops.
/// Observers run inline on the request path and must not block.
pub trait DecisionObserver: Send + Sync {
    /// Called with the request body just before it is sent.
    fn on_request(&self, _request: &Value) {}

    /// Called with the parsed response body before the decision is extracted.
    fn on_response(&self, _response: &Value) {}
}
