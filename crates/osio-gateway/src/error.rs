//! Error type for the cluster gateway (spec.md §7).

use thiserror::Error;

/// Errors that can escape a gateway call after the retry policy has been
/// applied. A `500` that the policy marks `retry` is absorbed silently and
/// never surfaces here; only a terminal condition does.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("kubernetes api error: {0}")]
    Api(#[from] kube::Error),

    #[error("object not found: {kind} {namespace}/{name}")]
    NotFound { kind: &'static str, namespace: String, name: String },

    #[error("watch timed out after {0:?}")]
    WatchTimeout(std::time::Duration),
}
