//! `DeletePodType`/`DeletePod` — the standard fault prototype (spec.md §4.4).

use crate::{Failure, FailureType, NoSafeFailures};
use k8s_openapi::api::apps::v1::Deployment;
use osio_gateway::ClusterGateway;
use osio_health::HealthOracle;
use rand::seq::SliceRandom;
use std::fmt;
use std::sync::Arc;

fn deployment_selector(d: &Deployment) -> Option<String> {
    let labels = d.spec.as_ref()?.selector.match_labels.as_ref()?;
    Some(labels.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join(","))
}

fn deployment_is_safe(d: &Deployment) -> bool {
    let wanted = d.spec.as_ref().and_then(|s| s.replicas).unwrap_or(0);
    let ready = d.status.as_ref().and_then(|s| s.ready_replicas).unwrap_or(0);
    wanted == ready
}

/// One specific pod deletion, targeting a pod under a known deployment.
pub struct DeletePod<G> {
    gateway: Arc<G>,
    namespace: String,
    pod_name: String,
    deployment_name: String,
}

impl<G: ClusterGateway> fmt::Display for DeletePod<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F(delete pod: {}/{})", self.namespace, self.pod_name)
    }
}

#[async_trait::async_trait]
impl<G: ClusterGateway + 'static> Failure for DeletePod<G> {
    async fn invoke(&self) -> Result<(), osio_gateway::ClusterError> {
        self.gateway.delete_pod(&self.namespace, &self.pod_name, 0).await
    }

    async fn mitigated(&self, timeout_secs: f64) -> Result<bool, osio_gateway::ClusterError> {
        let timeout = std::time::Duration::from_secs_f64(timeout_secs.max(0.0));
        self.gateway.watch_deployment_ready(&self.namespace, &self.deployment_name, timeout).await
    }

    async fn repair(&self) -> Result<(), osio_gateway::ClusterError> {
        // The orchestrator self-heals a deleted pod; nothing to do.
        Ok(())
    }
}

/// Prototype: "delete one pod of SUT component matching `label_selector`".
pub struct DeletePodType<G> {
    gateway: Arc<G>,
    health: Arc<dyn HealthOracle>,
    namespace: String,
    label_selector: String,
}

impl<G> DeletePodType<G> {
    pub fn new(
        gateway: Arc<G>,
        health: Arc<dyn HealthOracle>,
        namespace: impl Into<String>,
        label_selector: impl Into<String>,
    ) -> Self {
        Self { gateway, health, namespace: namespace.into(), label_selector: label_selector.into() }
    }
}

impl<G> fmt::Display for DeletePodType<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FT(delete pod: ns:{} selector:{})", self.namespace, self.label_selector)
    }
}

#[async_trait::async_trait]
impl<G: ClusterGateway + 'static> FailureType for DeletePodType<G> {
    async fn get(&self) -> Result<Box<dyn Failure>, NoSafeFailures> {
        let healthy = self
            .health
            .healthy(0.0)
            .await
            .map_err(|e| NoSafeFailures(format!("health check failed: {e}")))?;
        if !healthy {
            return Err(NoSafeFailures("cluster unhealthy".to_string()));
        }

        let deployments = self
            .gateway
            .list_deployments(&self.namespace, Some(&self.label_selector))
            .await
            .map_err(|e| NoSafeFailures(format!("list deployments failed: {e}")))?;
        if deployments.is_empty() {
            return Err(NoSafeFailures(format!("no deployments matched: {}", self.label_selector)));
        }

        // Each SUT component has one deployment per replica; killing a pod
        // in an already-degraded component is unsafe.
        if !deployments.iter().all(deployment_is_safe) {
            return Err(NoSafeFailures("no pods safe to kill".to_string()));
        }

        let mut rng = rand::thread_rng();
        let mut shuffled = deployments;
        shuffled.shuffle(&mut rng);
        let deployment = shuffled.first().ok_or_else(|| NoSafeFailures("no deployments matched".to_string()))?;
        let deployment_name = deployment.metadata.name.clone().unwrap_or_default();
        let pod_selector = deployment_selector(deployment)
            .ok_or_else(|| NoSafeFailures(format!("deployment {deployment_name} has no selector")))?;

        let pods = self
            .gateway
            .list_pods(&self.namespace, &pod_selector)
            .await
            .map_err(|e| NoSafeFailures(format!("list pods failed: {e}")))?;
        let pod = pods.choose(&mut rng).ok_or_else(|| NoSafeFailures(format!("no pods matched: {pod_selector}")))?;
        let pod_name = pod.metadata.name.clone().unwrap_or_default();

        Ok(Box::new(DeletePod {
            gateway: self.gateway.clone(),
            namespace: self.namespace.clone(),
            pod_name,
            deployment_name,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, DeploymentStatus};
    use k8s_openapi::api::core::v1::Pod;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
    use osio_core::FakeClock;
    use osio_gateway::FakeGateway;
    use osio_health::CephHealthOracle;
    use std::collections::BTreeMap;

    fn deployment(name: &str, replicas: i32, ready: i32, match_key: &str) -> Deployment {
        let mut match_labels = BTreeMap::new();
        match_labels.insert("component".to_string(), match_key.to_string());
        let mut top_labels = BTreeMap::new();
        top_labels.insert("app".to_string(), "rook-ceph-osd".to_string());
        Deployment {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                labels: Some(top_labels),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                replicas: Some(replicas),
                selector: LabelSelector { match_labels: Some(match_labels), ..Default::default() },
                ..Default::default()
            }),
            status: Some(DeploymentStatus { ready_replicas: Some(ready), ..Default::default() }),
        }
    }

    fn pod(name: &str, component: &str) -> Pod {
        let mut labels = BTreeMap::new();
        labels.insert("component".to_string(), component.to_string());
        Pod {
            metadata: ObjectMeta { name: Some(name.to_string()), labels: Some(labels), ..Default::default() },
            ..Default::default()
        }
    }

    fn healthy_oracle(gw: Arc<FakeGateway>) -> Arc<dyn HealthOracle> {
        gw.seed_custom_object(
            osio_gateway::CustomObjectRef {
                group: "ceph.rook.io",
                version: "v1",
                kind: "CephCluster",
                namespace: "rook-ceph",
                name: "rook-ceph",
            },
            serde_json::json!({"status": {"ceph": {"health": "HEALTH_OK"}}}),
        );
        Arc::new(CephHealthOracle::new(gw, FakeClock::new(0.0), "rook-ceph", "rook-ceph"))
    }

    /// Scenario E — one degraded deployment among the matches => NoSafeFailures.
    #[tokio::test]
    async fn scenario_e_degraded_deployment_yields_no_safe_failures() {
        let gw = Arc::new(FakeGateway::new());
        let health = healthy_oracle(gw.clone());
        gw.seed_deployment("rook-ceph", deployment("osd-0", 3, 2, "osd"));
        gw.seed_deployment("rook-ceph", deployment("osd-1", 3, 3, "osd"));

        let ft = DeletePodType::new(gw, health, "rook-ceph", "app=rook-ceph-osd");
        let err = ft.get().await.unwrap_err();
        assert_eq!(err.0, "no pods safe to kill");
    }

    #[tokio::test]
    async fn get_returns_a_pod_under_a_safe_deployment() {
        let gw = Arc::new(FakeGateway::new());
        let health = healthy_oracle(gw.clone());
        gw.seed_deployment("rook-ceph", deployment("osd-0", 3, 3, "osd"));
        gw.seed_pod("rook-ceph", pod("osd-0-abcde", "osd"));
        gw.seed_pod("rook-ceph", pod("osd-0-fghij", "osd"));

        let ft = DeletePodType::new(gw, health, "rook-ceph", "app=rook-ceph-osd");
        let failure = ft.get().await.unwrap();
        let rendered = failure.to_string();
        assert!(rendered.contains("rook-ceph/"));
    }

    #[tokio::test]
    async fn no_matching_deployments_yields_no_safe_failures() {
        let gw = Arc::new(FakeGateway::new());
        let health = healthy_oracle(gw.clone());
        let ft = DeletePodType::new(gw, health, "rook-ceph", "app=rook-ceph-osd");
        assert!(ft.get().await.is_err());
    }

    #[tokio::test]
    async fn unhealthy_cluster_yields_no_safe_failures() {
        let gw = Arc::new(FakeGateway::new());
        gw.seed_custom_object(
            osio_gateway::CustomObjectRef {
                group: "ceph.rook.io",
                version: "v1",
                kind: "CephCluster",
                namespace: "rook-ceph",
                name: "rook-ceph",
            },
            serde_json::json!({"status": {"ceph": {"health": "HEALTH_WARN"}}}),
        );
        let health: Arc<dyn HealthOracle> =
            Arc::new(CephHealthOracle::new(gw.clone(), FakeClock::new(0.0), "rook-ceph", "rook-ceph"));
        gw.seed_deployment("rook-ceph", deployment("osd-0", 3, 3, "osd"));
        let ft = DeletePodType::new(gw, health, "rook-ceph", "app=rook-ceph-osd");
        let err = ft.get().await.unwrap_err();
        assert_eq!(err.0, "cluster unhealthy");
    }

    #[tokio::test]
    async fn invoke_deletes_the_target_pod() {
        let gw = Arc::new(FakeGateway::new());
        gw.seed_pod("rook-ceph", pod("osd-0-abcde", "osd"));
        let failure = DeletePod { gateway: gw.clone(), namespace: "rook-ceph".into(), pod_name: "osd-0-abcde".into(), deployment_name: "osd-0".into() };
        failure.invoke().await.unwrap();
        let remaining = gw.list_pods("rook-ceph", "component=osd").await.unwrap();
        assert!(remaining.is_empty());
    }
}
