// SPDX-License-Identifier: MIT

//! Workload factory, lifecycle state machine, resumption, and pod
//! start/stop observability (spec.md §4.6–§4.8).

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod creator;
mod error;
mod lifecycle;
mod manifest;
mod resume;
mod watchers;

pub use creator::Creator;
pub use error::LifecycleError;
pub use lifecycle::Lifecycle;
pub use manifest::{
    build_deployment, build_pvc, deployment_name, new_workload_manifests, pvc_name, WorkloadManifests,
    DEPLOYMENT_ID_LABEL,
};
pub use resume::resume;
pub use watchers::{spawn_pod_start_watcher, spawn_pod_stop_watcher, WatcherPool};
