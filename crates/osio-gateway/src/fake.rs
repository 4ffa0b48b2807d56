//! In-memory [`ClusterGateway`] for unit tests, enabled by the
//! `test-support` feature. Mirrors the shape of the teacher's fake adapters:
//! plain data behind a `Mutex`, no real network calls.

use crate::{ClusterError, ClusterGateway, CustomObjectRef};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

fn labels_match(obj_labels: &std::collections::BTreeMap<String, String>, selector: &str) -> bool {
    selector.split(',').map(str::trim).filter(|s| !s.is_empty()).all(|clause| match clause.split_once('=') {
        Some((k, v)) => obj_labels.get(k).map(|got| got == v).unwrap_or(false),
        None => obj_labels.contains_key(clause),
    })
}

#[derive(Default)]
struct State {
    deployments: HashMap<(String, String), Deployment>,
    pvcs: HashMap<(String, String), PersistentVolumeClaim>,
    pods: HashMap<(String, String), Pod>,
    custom_objects: HashMap<(String, String, String, String, String), serde_json::Value>,
    namespaces: Vec<String>,
    /// Set of (namespace, name) deployments that should never report ready,
    /// to simulate a degraded SUT component.
    pub degraded_deployments: std::collections::HashSet<(String, String)>,
}

/// A fully in-memory gateway: no network, no Kubernetes cluster required.
/// Tests configure it directly via the `*_seed` helpers and then exercise
/// the component under test through the [`ClusterGateway`] trait.
#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<State>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_deployment(&self, namespace: &str, deployment: Deployment) {
        let name = deployment.metadata.name.clone().unwrap_or_default();
        self.state.lock().unwrap().deployments.insert((namespace.to_string(), name), deployment);
    }

    pub fn seed_pvc(&self, namespace: &str, pvc: PersistentVolumeClaim) {
        let name = pvc.metadata.name.clone().unwrap_or_default();
        self.state.lock().unwrap().pvcs.insert((namespace.to_string(), name), pvc);
    }

    pub fn seed_pod(&self, namespace: &str, pod: Pod) {
        let name = pod.metadata.name.clone().unwrap_or_default();
        self.state.lock().unwrap().pods.insert((namespace.to_string(), name), pod);
    }

    pub fn seed_custom_object(&self, obj: CustomObjectRef<'_>, value: serde_json::Value) {
        self.state.lock().unwrap().custom_objects.insert(
            (obj.group.to_string(), obj.version.to_string(), obj.kind.to_string(), obj.namespace.to_string(), obj.name.to_string()),
            value,
        );
    }

    pub fn mark_degraded(&self, namespace: &str, name: &str) {
        self.state.lock().unwrap().degraded_deployments.insert((namespace.to_string(), name.to_string()));
    }

    pub fn has_pvc(&self, namespace: &str, name: &str) -> bool {
        self.state.lock().unwrap().pvcs.contains_key(&(namespace.to_string(), name.to_string()))
    }

    pub fn has_deployment(&self, namespace: &str, name: &str) -> bool {
        self.state.lock().unwrap().deployments.contains_key(&(namespace.to_string(), name.to_string()))
    }

    pub fn deployment_annotations(&self, namespace: &str, name: &str) -> Option<HashMap<String, String>> {
        self.state
            .lock()
            .unwrap()
            .deployments
            .get(&(namespace.to_string(), name.to_string()))
            .map(|d| d.metadata.annotations.clone().unwrap_or_default().into_iter().collect())
    }
}

#[async_trait::async_trait]
impl ClusterGateway for FakeGateway {
    async fn ensure_namespace(&self, name: &str) -> Result<(), ClusterError> {
        let mut s = self.state.lock().unwrap();
        if !s.namespaces.contains(&name.to_string()) {
            s.namespaces.push(name.to_string());
        }
        Ok(())
    }

    async fn list_deployments(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<Deployment>, ClusterError> {
        let s = self.state.lock().unwrap();
        Ok(s.deployments
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, d)| d.clone())
            .filter(|d| match label_selector {
                Some(sel) => labels_match(&d.metadata.labels.clone().unwrap_or_default(), sel),
                None => true,
            })
            .collect())
    }

    async fn get_deployment(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Deployment>, ClusterError> {
        Ok(self.state.lock().unwrap().deployments.get(&(namespace.to_string(), name.to_string())).cloned())
    }

    async fn create_deployment(&self, namespace: &str, deployment: Deployment) -> Result<(), ClusterError> {
        self.seed_deployment(namespace, deployment);
        Ok(())
    }

    async fn delete_deployment(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.state.lock().unwrap().deployments.remove(&(namespace.to_string(), name.to_string()));
        Ok(())
    }

    async fn patch_deployment(
        &self,
        namespace: &str,
        name: &str,
        merge_patch: serde_json::Value,
    ) -> Result<Deployment, ClusterError> {
        let mut s = self.state.lock().unwrap();
        let key = (namespace.to_string(), name.to_string());
        let d = s.deployments.get_mut(&key).ok_or_else(|| ClusterError::NotFound {
            kind: "Deployment",
            namespace: namespace.to_string(),
            name: name.to_string(),
        })?;
        let mut current = serde_json::to_value(&*d).unwrap_or(serde_json::json!({}));
        json_merge(&mut current, &merge_patch);
        *d = serde_json::from_value(current).map_err(|_| ClusterError::NotFound {
            kind: "Deployment",
            namespace: namespace.to_string(),
            name: name.to_string(),
        })?;
        Ok(d.clone())
    }

    async fn create_pvc(&self, namespace: &str, pvc: PersistentVolumeClaim) -> Result<(), ClusterError> {
        self.seed_pvc(namespace, pvc);
        Ok(())
    }

    async fn delete_pvc(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.state.lock().unwrap().pvcs.remove(&(namespace.to_string(), name.to_string()));
        Ok(())
    }

    async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>, ClusterError> {
        let s = self.state.lock().unwrap();
        Ok(s.pods
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, p)| p.clone())
            .filter(|p| labels_match(&p.metadata.labels.clone().unwrap_or_default(), label_selector))
            .collect())
    }

    async fn delete_pod(
        &self,
        namespace: &str,
        name: &str,
        _grace_period_secs: i64,
    ) -> Result<(), ClusterError> {
        self.state.lock().unwrap().pods.remove(&(namespace.to_string(), name.to_string()));
        Ok(())
    }

    async fn get_custom_object(
        &self,
        obj: CustomObjectRef<'_>,
    ) -> Result<serde_json::Value, ClusterError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .custom_objects
            .get(&(obj.group.to_string(), obj.version.to_string(), obj.kind.to_string(), obj.namespace.to_string(), obj.name.to_string()))
            .cloned()
            .unwrap_or(serde_json::json!({})))
    }

    async fn watch_deployment_ready(
        &self,
        namespace: &str,
        name: &str,
        _timeout: Duration,
    ) -> Result<bool, ClusterError> {
        let s = self.state.lock().unwrap();
        if s.degraded_deployments.contains(&(namespace.to_string(), name.to_string())) {
            return Ok(false);
        }
        Ok(s.deployments
            .get(&(namespace.to_string(), name.to_string()))
            .map(|d| {
                let wanted = d.spec.as_ref().and_then(|sp| sp.replicas).unwrap_or(0);
                let ready = d.status.as_ref().and_then(|st| st.ready_replicas).unwrap_or(wanted);
                wanted == ready
            })
            .unwrap_or(false))
    }

    async fn watch_pod_running(
        &self,
        _namespace: &str,
        _label_selector: &str,
        _timeout: Duration,
    ) -> Result<bool, ClusterError> {
        Ok(true)
    }

    async fn watch_pod_deleted(
        &self,
        _namespace: &str,
        _label_selector: &str,
        _timeout: Duration,
    ) -> Result<bool, ClusterError> {
        Ok(true)
    }
}

fn json_merge(base: &mut serde_json::Value, patch: &serde_json::Value) {
    match (base, patch) {
        (serde_json::Value::Object(base_map), serde_json::Value::Object(patch_map)) => {
            for (k, v) in patch_map {
                if v.is_null() {
                    base_map.remove(k);
                } else {
                    json_merge(base_map.entry(k.clone()).or_insert(serde_json::Value::Null), v);
                }
            }
        }
        (base_slot, patch_value) => {
            *base_slot = patch_value.clone();
        }
    }
}
