//! Lifecycle resumption: on controller start, re-discover already-running
//! workload instances from their `controller=osio` label (spec.md §4.7
//! "Resumption").

use crate::lifecycle::Lifecycle;
use osio_core::{Clock, CONTROLLER_LABEL_KEY, CONTROLLER_LABEL_VALUE};
use osio_dispatcher::Action;
use osio_gateway::ClusterGateway;
use std::sync::Arc;

/// List deployments labeled `controller=osio` in `namespace` and enqueue one
/// Lifecycle Action per deployment at `when=0`. The annotations already on
/// each deployment drive exactly-once catch-up (spec.md §4.7).
pub async fn resume<G, C>(
    gateway: Arc<G>,
    clock: C,
    namespace: &str,
    workaround_min_runtime: bool,
) -> Result<Vec<Box<dyn Action>>, osio_gateway::ClusterError>
where
    G: ClusterGateway + 'static,
    C: Clock,
{
    let selector = format!("{CONTROLLER_LABEL_KEY}={CONTROLLER_LABEL_VALUE}");
    let deployments = gateway.list_deployments(namespace, Some(&selector)).await?;

    let mut actions: Vec<Box<dyn Action>> = Vec::with_capacity(deployments.len());
    for deployment in deployments {
        let Some(name) = deployment.metadata.name else { continue };
        tracing::info!(namespace, name = %name, "resuming lifecycle for existing workload instance");
        actions.push(Box::new(Lifecycle::new(
            namespace.to_string(),
            name,
            gateway.clone(),
            clock.clone(),
            workaround_min_runtime,
            0.0,
        )));
    }
    Ok(actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use osio_core::FakeClock;
    use osio_gateway::FakeGateway;
    use k8s_openapi::api::apps::v1::Deployment;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    fn labeled_deployment(name: &str) -> Deployment {
        let mut labels = BTreeMap::new();
        labels.insert(CONTROLLER_LABEL_KEY.to_string(), CONTROLLER_LABEL_VALUE.to_string());
        Deployment {
            metadata: ObjectMeta { name: Some(name.to_string()), labels: Some(labels), ..Default::default() },
            ..Default::default()
        }
    }

    /// Invariant 7 — resumption enqueues exactly one Lifecycle per
    /// `controller=osio` deployment.
    #[tokio::test]
    async fn resume_enqueues_one_lifecycle_per_labeled_deployment() {
        let gw = Arc::new(FakeGateway::new());
        gw.seed_deployment("ns", labeled_deployment("osio-worker-1"));
        gw.seed_deployment("ns", labeled_deployment("osio-worker-2"));
        gw.seed_deployment(
            "ns",
            Deployment {
                metadata: ObjectMeta { name: Some("unrelated".to_string()), ..Default::default() },
                ..Default::default()
            },
        );

        let actions = resume(gw, FakeClock::new(0.0), "ns", false).await.unwrap();
        assert_eq!(actions.len(), 2);
        assert!(actions.iter().all(|a| a.when() == 0.0));
    }

    #[tokio::test]
    async fn resume_against_an_empty_namespace_yields_no_actions() {
        let gw = Arc::new(FakeGateway::new());
        let actions = resume(gw, FakeClock::new(0.0), "ns", false).await.unwrap();
        assert!(actions.is_empty());
    }
}
