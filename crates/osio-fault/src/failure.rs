//! The [`Failure`]/[`FailureType`] framework (spec.md §3, §4.4).

use crate::NoSafeFailures;
use osio_gateway::ClusterError;
use std::fmt;

/// One specific in-flight fault. Lifecycle: Unarmed -> (invoke) ->
/// Armed-awaiting-mitigation -> (mitigated) -> Mitigated -> (repair) ->
/// Repaired (terminal). `repair` is idempotent and may be a no-op.
#[async_trait::async_trait]
pub trait Failure: fmt::Display + Send + Sync {
    /// Invoke the damage on the system.
    async fn invoke(&self) -> Result<(), ClusterError>;

    /// Determine if the SUT has mitigated the failure within `timeout`.
    async fn mitigated(&self, timeout_secs: f64) -> Result<bool, ClusterError>;

    /// Repair residual damage. Idempotent; may be a no-op.
    async fn repair(&self) -> Result<(), ClusterError>;
}

/// A stateless descriptor of a *class* of faults. Sole operation: produce a
/// concrete, safe [`Failure`] instance, or signal [`NoSafeFailures`].
#[async_trait::async_trait]
pub trait FailureType: fmt::Display + Send + Sync {
    async fn get(&self) -> Result<Box<dyn Failure>, NoSafeFailures>;
}
