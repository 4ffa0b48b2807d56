//! Error types for the fault framework (spec.md §7).

use osio_gateway::ClusterError;
use thiserror::Error;

/// "No safe-to-execute failures can be found" — an expected control signal,
/// never a bug. Callers either swallow it (the injection loop, per
/// spec.md §4.5: "no fault is pushed") or re-raise it (the selector, per
/// spec.md §4.4).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("no safe failures available: {0}")]
pub struct NoSafeFailures(pub String);

/// Fatal errors from the fault framework (spec.md §7).
#[derive(Debug, Error)]
pub enum FaultError {
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    Health(#[from] osio_health::HealthError),

    /// The SUT failed to recover within `mitigation_timeout` — fatal,
    /// aborts the chaos loop (spec.md §7, §9: "surface an explicit error
    /// type instead" of the original's bare `assert`).
    #[error("mitigation timed out after {timeout_secs}s for {failure}")]
    MitigationTimeout { failure: String, timeout_secs: f64 },
}
