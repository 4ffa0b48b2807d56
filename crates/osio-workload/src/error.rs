//! Errors for the workload factory and lifecycle state machine (spec.md §7).

use osio_core::UnknownNextAction;
use osio_gateway::ClusterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    UnknownNextAction(#[from] UnknownNextAction),

    /// A workload instance failed its health invariant — fatal, propagates
    /// out of the dispatcher (spec.md §4.7 "health", §7).
    #[error("deployment {namespace}/{name} failed its health invariant")]
    UnhealthyDeployment { namespace: String, name: String },
}
