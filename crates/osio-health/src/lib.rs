// SPDX-License-Identifier: MIT

//! SUT health oracle (spec.md §4.3): reads the Ceph health CRD and answers
//! `healthy(timeout)` and `problems()`.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use osio_core::Clock;
use osio_gateway::{ClusterError, ClusterGateway, CustomObjectRef};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HealthError {
    #[error(transparent)]
    Cluster(#[from] ClusterError),
}

/// One entry in the problems map derived from `status.ceph.details`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Problem {
    pub message: String,
    pub severity: String,
}

/// The string the CRD must report under `status.ceph.health` to be
/// considered healthy (spec.md §4.3).
const HEALTH_OK: &str = "HEALTH_OK";

/// Single operation `healthy(timeout_seconds)` plus `problems()`
/// (spec.md §4.3). Queries the health CRD at `(namespace, name)`.
pub struct CephHealthOracle<G, C> {
    gateway: Arc<G>,
    clock: C,
    namespace: String,
    name: String,
}

impl<G: ClusterGateway, C: Clock> CephHealthOracle<G, C> {
    pub fn new(gateway: Arc<G>, clock: C, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self { gateway, clock, namespace: namespace.into(), name: name.into() }
    }

    fn crd_ref(&self) -> CustomObjectRef<'_> {
        CustomObjectRef {
            group: "ceph.rook.io",
            version: "v1",
            kind: "CephCluster",
            namespace: &self.namespace,
            name: &self.name,
        }
    }

    async fn fetch(&self) -> Result<serde_json::Value, HealthError> {
        Ok(self.gateway.get_custom_object(self.crd_ref()).await?)
    }

    /// True iff `status.ceph.health == "HEALTH_OK"`. Missing `status` or
    /// `status.ceph` implies unhealthy (spec.md §4.3).
    async fn is_healthy_once(&self) -> Result<bool, HealthError> {
        let crd = self.fetch().await?;
        let health = crd.pointer("/status/ceph/health").and_then(|v| v.as_str());
        Ok(health == Some(HEALTH_OK))
    }

    /// Poll until either healthy or `now + timeout_seconds` passes.
    ///
    /// Iterative, not recursive (SPEC_FULL.md §9): each unsuccessful attempt
    /// sleeps at most 1s before retrying.
    pub async fn healthy(&self, timeout_seconds: f64) -> Result<bool, HealthError> {
        if self.is_healthy_once().await? {
            return Ok(true);
        }
        let deadline = self.clock.now() + timeout_seconds;
        loop {
            if self.clock.now() >= deadline {
                return Ok(false);
            }
            if self.is_healthy_once().await? {
                return Ok(true);
            }
            self.clock.sleep_until((self.clock.now() + 1.0).min(deadline)).await;
        }
    }

    /// Problems derived from `status.ceph.details` (empty when missing).
    pub async fn problems(&self) -> Result<HashMap<String, Problem>, HealthError> {
        let crd = self.fetch().await?;
        let details = match crd.pointer("/status/ceph/details") {
            Some(serde_json::Value::Object(map)) => map,
            _ => return Ok(HashMap::new()),
        };
        let mut out = HashMap::new();
        for (key, value) in details {
            let message = value.get("message").and_then(|m| m.as_str()).unwrap_or_default().to_string();
            let severity = value.get("severity").and_then(|s| s.as_str()).unwrap_or_default().to_string();
            out.insert(key.clone(), Problem { message, severity });
        }
        Ok(out)
    }
}

/// Object-safe facade over a health oracle, so fault prototypes and the
/// injection loop (`osio-fault`) can hold `Arc<dyn HealthOracle>` without
/// fixing a concrete gateway/clock pair.
#[async_trait::async_trait]
pub trait HealthOracle: Send + Sync {
    async fn healthy(&self, timeout_seconds: f64) -> Result<bool, HealthError>;
    async fn problems(&self) -> Result<HashMap<String, Problem>, HealthError>;
}

#[async_trait::async_trait]
impl<G, C> HealthOracle for CephHealthOracle<G, C>
where
    G: ClusterGateway + 'static,
    C: Clock,
{
    async fn healthy(&self, timeout_seconds: f64) -> Result<bool, HealthError> {
        CephHealthOracle::healthy(self, timeout_seconds).await
    }

    async fn problems(&self) -> Result<HashMap<String, Problem>, HealthError> {
        CephHealthOracle::problems(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osio_core::FakeClock;
    use osio_gateway::FakeGateway;
    use serde_json::json;

    fn oracle(gw: Arc<FakeGateway>, clock: FakeClock) -> CephHealthOracle<FakeGateway, FakeClock> {
        CephHealthOracle::new(gw, clock, "rook-ceph", "rook-ceph")
    }

    #[tokio::test]
    async fn healthy_true_when_crd_reports_health_ok() {
        let gw = Arc::new(FakeGateway::new());
        gw.seed_custom_object(
            CustomObjectRef { group: "ceph.rook.io", version: "v1", kind: "CephCluster", namespace: "rook-ceph", name: "rook-ceph" },
            json!({"status": {"ceph": {"health": "HEALTH_OK"}}}),
        );
        let o = oracle(gw, FakeClock::new(0.0));
        assert!(o.healthy(10.0).await.unwrap());
    }

    #[tokio::test]
    async fn missing_status_implies_unhealthy_and_times_out() {
        let gw = Arc::new(FakeGateway::new());
        let clock = FakeClock::new(0.0);
        let o = oracle(gw, clock);
        assert!(!o.healthy(5.0).await.unwrap());
    }

    #[tokio::test]
    async fn missing_ceph_key_implies_unhealthy() {
        let gw = Arc::new(FakeGateway::new());
        gw.seed_custom_object(
            CustomObjectRef { group: "ceph.rook.io", version: "v1", kind: "CephCluster", namespace: "rook-ceph", name: "rook-ceph" },
            json!({"status": {}}),
        );
        let o = oracle(gw, FakeClock::new(0.0));
        assert!(!o.healthy(5.0).await.unwrap());
    }

    #[tokio::test]
    async fn problems_reads_status_ceph_details() {
        let gw = Arc::new(FakeGateway::new());
        gw.seed_custom_object(
            CustomObjectRef { group: "ceph.rook.io", version: "v1", kind: "CephCluster", namespace: "rook-ceph", name: "rook-ceph" },
            json!({"status": {"ceph": {"health": "HEALTH_WARN", "details": {
                "MON_DISK_LOW": {"message": "mon disk space low", "severity": "HEALTH_WARN"}
            }}}}),
        );
        let o = oracle(gw, FakeClock::new(0.0));
        let problems = o.problems().await.unwrap();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems["MON_DISK_LOW"].message, "mon disk space low");
    }

    #[tokio::test]
    async fn problems_empty_when_details_missing() {
        let gw = Arc::new(FakeGateway::new());
        let o = oracle(gw, FakeClock::new(0.0));
        assert!(o.problems().await.unwrap().is_empty());
    }
}
