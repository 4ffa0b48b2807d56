//! The [`ClusterGateway`] trait and its real Kubernetes-backed implementation.

use crate::retry::{call_with_retry, Codes, RetryAction};
use crate::ClusterError;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod};
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams, WatchEvent};
use kube::core::{DynamicObject, GroupVersionKind};
use kube::discovery::ApiResource;
use kube::Client;
use std::time::Duration;

/// A reference to a namespaced custom object, e.g. the SUT's health CRD.
#[derive(Debug, Clone, Copy)]
pub struct CustomObjectRef<'a> {
    pub group: &'a str,
    pub version: &'a str,
    pub kind: &'a str,
    pub namespace: &'a str,
    pub name: &'a str,
}

/// Typed, retrying RPC surface over the orchestration API (spec.md §4.1,
/// §6.1). No strong typing is required for the CRD path — callers walk the
/// returned `serde_json::Value` by key path, matching the "generic map/tree"
/// requirement in spec.md §3.
#[async_trait::async_trait]
pub trait ClusterGateway: Send + Sync {
    /// Create a namespace; a 409 (already exists) is tolerated.
    async fn ensure_namespace(&self, name: &str) -> Result<(), ClusterError>;

    async fn list_deployments(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<Deployment>, ClusterError>;

    async fn get_deployment(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Deployment>, ClusterError>;

    async fn create_deployment(&self, namespace: &str, deployment: Deployment) -> Result<(), ClusterError>;

    async fn delete_deployment(&self, namespace: &str, name: &str) -> Result<(), ClusterError>;

    /// JSON merge-patch a deployment's metadata (annotations), returning the
    /// patched object.
    async fn patch_deployment(
        &self,
        namespace: &str,
        name: &str,
        merge_patch: serde_json::Value,
    ) -> Result<Deployment, ClusterError>;

    async fn create_pvc(&self, namespace: &str, pvc: PersistentVolumeClaim) -> Result<(), ClusterError>;

    async fn delete_pvc(&self, namespace: &str, name: &str) -> Result<(), ClusterError>;

    async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>, ClusterError>;

    async fn delete_pod(
        &self,
        namespace: &str,
        name: &str,
        grace_period_secs: i64,
    ) -> Result<(), ClusterError>;

    async fn get_custom_object(
        &self,
        obj: CustomObjectRef<'_>,
    ) -> Result<serde_json::Value, ClusterError>;

    /// Watch the named deployment until an event shows
    /// `status.ready_replicas == spec.replicas`, or `timeout` elapses.
    /// Returns `true` iff mitigated before the deadline.
    async fn watch_deployment_ready(
        &self,
        namespace: &str,
        name: &str,
        timeout: Duration,
    ) -> Result<bool, ClusterError>;

    /// Watch pods matching `label_selector` until one reaches
    /// `status.phase == "Running"`, or `timeout` elapses.
    async fn watch_pod_running(
        &self,
        namespace: &str,
        label_selector: &str,
        timeout: Duration,
    ) -> Result<bool, ClusterError>;

    /// Watch pods matching `label_selector` until a `DELETED` event is
    /// observed, or `timeout` elapses.
    async fn watch_pod_deleted(
        &self,
        namespace: &str,
        label_selector: &str,
        timeout: Duration,
    ) -> Result<bool, ClusterError>;
}

/// Real gateway, backed by `kube::Client`.
pub struct KubeGateway {
    client: Client,
    codes: Codes,
}

impl KubeGateway {
    pub async fn try_default() -> Result<Self, ClusterError> {
        let client = Client::try_default().await?;
        Ok(Self { client, codes: Codes::default() })
    }

    pub fn new(client: Client) -> Self {
        Self { client, codes: Codes::default() }
    }

    fn deployments(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn pvcs(&self, namespace: &str) -> Api<PersistentVolumeClaim> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn dynamic(&self, obj: CustomObjectRef<'_>) -> Api<DynamicObject> {
        let gvk = GroupVersionKind::gvk(obj.group, obj.version, obj.kind);
        let api_resource = ApiResource::from_gvk(&gvk);
        Api::namespaced_with(self.client.clone(), obj.namespace, &api_resource)
    }
}

fn deployment_ready(d: &Deployment) -> bool {
    let wanted = d.spec.as_ref().and_then(|s| s.replicas).unwrap_or(0);
    let ready = d.status.as_ref().and_then(|s| s.ready_replicas).unwrap_or(0);
    wanted == ready
}

#[async_trait::async_trait]
impl ClusterGateway for KubeGateway {
    async fn ensure_namespace(&self, name: &str) -> Result<(), ClusterError> {
        use k8s_openapi::api::core::v1::Namespace;
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        let body = Namespace {
            metadata: kube::core::ObjectMeta { name: Some(name.to_string()), ..Default::default() },
            ..Default::default()
        };
        let codes = Codes::new().with(409, RetryAction::Ignore);
        call_with_retry(&codes, || async {
            namespaces.create(&PostParams::default(), &body).await
        })
        .await?;
        Ok(())
    }

    async fn list_deployments(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<Deployment>, ClusterError> {
        let api = self.deployments(namespace);
        let mut lp = ListParams::default();
        if let Some(sel) = label_selector {
            lp = lp.labels(sel);
        }
        let list = call_with_retry(&self.codes, || async { api.list(&lp).await }).await?;
        Ok(list.map(|l| l.items).unwrap_or_default())
    }

    async fn get_deployment(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Deployment>, ClusterError> {
        let api = self.deployments(namespace);
        let codes = Codes::default().with(404, RetryAction::Ignore);
        let got = call_with_retry(&codes, || async { api.get(name).await }).await?;
        Ok(got)
    }

    async fn create_deployment(&self, namespace: &str, deployment: Deployment) -> Result<(), ClusterError> {
        let api = self.deployments(namespace);
        let codes = Codes::default().with(409, RetryAction::Ignore);
        call_with_retry(&codes, || async { api.create(&PostParams::default(), &deployment).await })
            .await?;
        Ok(())
    }

    async fn delete_deployment(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        let api = self.deployments(namespace);
        let codes = Codes::default().with(404, RetryAction::Ignore);
        call_with_retry(&codes, || async { api.delete(name, &DeleteParams::default()).await }).await?;
        Ok(())
    }

    async fn patch_deployment(
        &self,
        namespace: &str,
        name: &str,
        merge_patch: serde_json::Value,
    ) -> Result<Deployment, ClusterError> {
        let api = self.deployments(namespace);
        let patch = Patch::Merge(merge_patch);
        let result = call_with_retry(&self.codes, || async {
            api.patch(name, &PatchParams::default(), &patch).await
        })
        .await?;
        result.ok_or_else(|| ClusterError::NotFound {
            kind: "Deployment",
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }

    async fn create_pvc(&self, namespace: &str, pvc: PersistentVolumeClaim) -> Result<(), ClusterError> {
        let api = self.pvcs(namespace);
        let codes = Codes::default().with(409, RetryAction::Ignore);
        call_with_retry(&codes, || async { api.create(&PostParams::default(), &pvc).await }).await?;
        Ok(())
    }

    async fn delete_pvc(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        let api = self.pvcs(namespace);
        let codes = Codes::default().with(404, RetryAction::Ignore);
        call_with_retry(&codes, || async { api.delete(name, &DeleteParams::default()).await }).await?;
        Ok(())
    }

    async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>, ClusterError> {
        let api = self.pods(namespace);
        let lp = ListParams::default().labels(label_selector);
        let list = call_with_retry(&self.codes, || async { api.list(&lp).await }).await?;
        Ok(list.map(|l| l.items).unwrap_or_default())
    }

    async fn delete_pod(
        &self,
        namespace: &str,
        name: &str,
        grace_period_secs: i64,
    ) -> Result<(), ClusterError> {
        let api = self.pods(namespace);
        let dp = DeleteParams { grace_period_seconds: Some(grace_period_secs as u32), ..Default::default() };
        let codes = Codes::default().with(404, RetryAction::Ignore);
        call_with_retry(&codes, || async { api.delete(name, &dp).await }).await?;
        Ok(())
    }

    async fn get_custom_object(
        &self,
        obj: CustomObjectRef<'_>,
    ) -> Result<serde_json::Value, ClusterError> {
        let api = self.dynamic(obj);
        let codes = Codes::default().with(404, RetryAction::Ignore);
        let got = call_with_retry(&codes, || async { api.get(obj.name).await }).await?;
        Ok(got.map(|o| o.data).unwrap_or_default())
    }

    async fn watch_deployment_ready(
        &self,
        namespace: &str,
        name: &str,
        timeout: Duration,
    ) -> Result<bool, ClusterError> {
        let api = self.deployments(namespace);
        let lp = ListParams::default()
            .fields(&format!("metadata.name={name}"))
            .timeout(timeout.as_secs().max(1) as u32);
        let mut stream = Box::pin(api.watch(&lp, "0").await.map_err(ClusterError::Api)?);
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }
            match tokio::time::timeout(remaining, futures_util::StreamExt::next(&mut stream)).await {
                Ok(Some(Ok(WatchEvent::Added(d) | WatchEvent::Modified(d)))) => {
                    if deployment_ready(&d) {
                        return Ok(true);
                    }
                }
                Ok(Some(Ok(_))) => continue,
                Ok(Some(Err(e))) => return Err(ClusterError::Api(e)),
                Ok(None) => return Ok(false),
                Err(_) => return Ok(false),
            }
        }
    }

    async fn watch_pod_running(
        &self,
        namespace: &str,
        label_selector: &str,
        timeout: Duration,
    ) -> Result<bool, ClusterError> {
        let api = self.pods(namespace);
        let lp = ListParams::default()
            .labels(label_selector)
            .timeout(timeout.as_secs().max(1) as u32);
        let mut stream = Box::pin(api.watch(&lp, "0").await.map_err(ClusterError::Api)?);
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }
            match tokio::time::timeout(remaining, futures_util::StreamExt::next(&mut stream)).await {
                Ok(Some(Ok(WatchEvent::Deleted(_)))) => return Ok(false),
                Ok(Some(Ok(WatchEvent::Added(p) | WatchEvent::Modified(p)))) => {
                    let phase = p.status.as_ref().and_then(|s| s.phase.as_deref());
                    if phase == Some("Running") {
                        return Ok(true);
                    }
                }
                Ok(Some(Ok(_))) => continue,
                Ok(Some(Err(e))) => return Err(ClusterError::Api(e)),
                Ok(None) => return Ok(false),
                Err(_) => return Ok(false),
            }
        }
    }

    async fn watch_pod_deleted(
        &self,
        namespace: &str,
        label_selector: &str,
        timeout: Duration,
    ) -> Result<bool, ClusterError> {
        let api = self.pods(namespace);
        let lp = ListParams::default()
            .labels(label_selector)
            .timeout(timeout.as_secs().max(1) as u32);
        let mut stream = Box::pin(api.watch(&lp, "0").await.map_err(ClusterError::Api)?);
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }
            match tokio::time::timeout(remaining, futures_util::StreamExt::next(&mut stream)).await {
                Ok(Some(Ok(WatchEvent::Deleted(_)))) => return Ok(true),
                Ok(Some(Ok(_))) => continue,
                Ok(Some(Err(e))) => return Err(ClusterError::Api(e)),
                Ok(None) => return Ok(false),
                Err(_) => return Ok(false),
            }
        }
    }
}
