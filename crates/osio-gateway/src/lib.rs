// SPDX-License-Identifier: MIT

//! Thin, retrying RPC surface over the Kubernetes orchestration API
//! (spec.md §4.1). Converts transient server errors into bounded retries
//! and exposes typed operations over tenant objects (workload deployments,
//! volume claims) and SUT component objects (deployments, pods, health CRD).

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod error;
mod retry;

#[cfg(any(test, feature = "test-support"))]
#[allow(clippy::unwrap_used)]
mod fake;

pub use client::{ClusterGateway, CustomObjectRef, KubeGateway};
pub use error::ClusterError;
pub use retry::{Codes, RetryAction};

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeGateway;
