//! Error taxonomy for the routing core.
//!
//! Provider-level fetch failures are recoverable and isolated; they are
//! downgraded to recorded [`crate::catalog::FetchAttempt`]s and only surface
//! as [`RouterError::AggregateFetch`] when every backend failed. Gateway
//! forwarding failures become HTTP error responses, never process exits.

use thiserror::Error;

/// All failure modes of the model-aware routing core.
#[derive(Debug, Error)]
pub enum RouterError {
    /// One backend's model-listing call failed. Recoverable; the other
    /// providers' results are unaffected.
    #[error("provider '{provider}' model listing failed: {reason}")]
    ProviderFetch { provider: String, reason: String },

    /// Every backend failed during a catalog refresh. The previous cache
    /// snapshot (if any) remains in use.
    #[error("all providers failed during catalog refresh: {}", failures.join("; "))]
    AggregateFetch { failures: Vec<String> },

    /// An inbound model could not be matched against the route table.
    #[error("no route for model '{model}'")]
    RouteNotFound { model: String },

    /// The backend produced no response at all (connect failure, timeout).
    /// Upstream HTTP *error statuses* are not errors here; the gateway
    /// relays them verbatim.
    #[error("upstream unavailable: {reason}")]
    UpstreamUnavailable { reason: String },

    /// Launch-time validation problems, accumulated rather than thrown
    /// individually. One entry per violation across all attempted providers.
    #[error("launch validation failed: {}", errors.join("; "))]
    Validation { errors: Vec<String> },

    /// Malformed provider descriptor or empty provider set. Fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(String),
}
