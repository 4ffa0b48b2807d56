//! The Creator Action: mints a fresh workload instance and re-queues itself
//! (spec.md §4.7).

use crate::lifecycle::Lifecycle;
use crate::manifest::{new_workload_manifests, DEPLOYMENT_ID_LABEL};
use crate::watchers::{spawn_pod_start_watcher, WatcherPool};
use osio_core::{
    Clock, WorkloadConfig, ANNOTATION_ACTIVE, ANNOTATION_DESTROY_AT, ANNOTATION_IDLE, ANNOTATION_PVC,
};
use osio_dispatcher::Action;
use osio_gateway::ClusterGateway;
use std::sync::Arc;

/// Re-queueing Action that mints a new workload instance every tick
/// (spec.md §4.7, "The Creator Action").
pub struct Creator<G, C> {
    gateway: Arc<G>,
    clock: C,
    config: Arc<WorkloadConfig>,
    watch_pool: WatcherPool,
    when: f64,
}

impl<G, C: Clock> Creator<G, C> {
    pub fn new(gateway: Arc<G>, clock: C, config: Arc<WorkloadConfig>, watch_pool: WatcherPool, when: f64) -> Self {
        Self { gateway, clock, config, watch_pool, when }
    }
}

#[async_trait::async_trait]
impl<G: ClusterGateway + 'static, C: Clock> Action for Creator<G, C> {
    fn when(&self) -> f64 {
        self.when
    }

    async fn execute(self: Box<Self>) -> anyhow::Result<Vec<Box<dyn Action>>> {
        let now = self.clock.now();

        let (next_arrival, destroy_at) = {
            let mut rng = rand::thread_rng();
            (
                now + osio_core::exponential_draw(&mut rng, self.config.interarrival_secs),
                now + osio_core::exponential_draw(&mut rng, self.config.lifetime_secs),
            )
        };

        let backs_kernel_untar = !self.config.kernel_untar.is_empty();
        let mut manifests = {
            let mut rng = rand::thread_rng();
            new_workload_manifests(&self.config, &mut rng, backs_kernel_untar)
        };

        let annotations = manifests.deployment.metadata.annotations.get_or_insert_with(Default::default);
        annotations.insert(ANNOTATION_ACTIVE.to_string(), self.config.active_secs.to_string());
        annotations.insert(ANNOTATION_IDLE.to_string(), self.config.idle_secs.to_string());
        annotations.insert(ANNOTATION_DESTROY_AT.to_string(), destroy_at.to_string());
        annotations.insert(ANNOTATION_PVC.to_string(), manifests.pvc.metadata.name.clone().unwrap_or_default());

        self.gateway.create_pvc(&self.config.namespace, manifests.pvc).await?;
        self.gateway.create_deployment(&self.config.namespace, manifests.deployment.clone()).await?;

        let deployment_name = manifests.deployment.metadata.name.clone().unwrap_or_default();
        tracing::info!(namespace = %self.config.namespace, name = %deployment_name, uid = %manifests.uid, "created workload instance");

        spawn_pod_start_watcher(
            self.gateway.clone(),
            self.watch_pool.clone(),
            self.config.namespace.clone(),
            format!("{DEPLOYMENT_ID_LABEL}={}", manifests.uid),
        );

        let next_creator = Creator {
            gateway: self.gateway.clone(),
            clock: self.clock.clone(),
            config: self.config.clone(),
            watch_pool: self.watch_pool.clone(),
            when: next_arrival,
        };
        let initial_lifecycle = Lifecycle::new(
            self.config.namespace.clone(),
            deployment_name,
            self.gateway.clone(),
            self.clock.clone(),
            self.config.workaround_min_runtime,
            0.0,
        );

        Ok(vec![Box::new(next_creator), Box::new(initial_lifecycle)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osio_core::{FakeClock, ANNOTATION_NEXT_ACTION};
    use osio_gateway::FakeGateway;

    #[tokio::test]
    async fn creator_tick_produces_a_fresh_creator_and_an_initial_lifecycle() {
        let gw = Arc::new(FakeGateway::new());
        let config = Arc::new(WorkloadConfig::default());
        let creator = Creator::new(gw.clone(), FakeClock::new(0.0), config, WatcherPool::new(), 0.0);

        let followups = Box::new(creator).execute().await.unwrap();
        assert_eq!(followups.len(), 2);
        assert!(followups[0].when() > 0.0);
        assert_eq!(followups[1].when(), 0.0);
    }

    #[tokio::test]
    async fn creator_stamps_the_four_initial_annotations() {
        let gw = Arc::new(FakeGateway::new());
        let config = Arc::new(WorkloadConfig::default());
        let creator = Creator::new(gw.clone(), FakeClock::new(0.0), config, WatcherPool::new(), 0.0);
        Box::new(creator).execute().await.unwrap();

        let deployments = gw.list_deployments("ocs-monkey", None).await.unwrap();
        assert_eq!(deployments.len(), 1);
        let annotations = deployments[0].metadata.annotations.clone().unwrap();
        assert!(annotations.contains_key(ANNOTATION_ACTIVE));
        assert!(annotations.contains_key(ANNOTATION_IDLE));
        assert!(annotations.contains_key(ANNOTATION_DESTROY_AT));
        assert!(annotations.contains_key(ANNOTATION_PVC));
        assert!(!annotations.contains_key(ANNOTATION_NEXT_ACTION));
    }
}
