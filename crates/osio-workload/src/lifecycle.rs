//! The Lifecycle Action: reads a workload deployment's annotations, advances
//! its state machine by exactly one tick, and reschedules itself
//! (spec.md §4.7).

use crate::error::LifecycleError;
use osio_core::{
    next_action_for, Clock, NextAction, ANNOTATION_ACTIVE, ANNOTATION_DESTROY_AT, ANNOTATION_HEALTH_AT,
    ANNOTATION_IDLE, ANNOTATION_IDLE_AT, ANNOTATION_NEXT_ACTION, ANNOTATION_NEXT_TIME, ANNOTATION_PVC,
    INITIAL_HEALTH_INTERVAL_SECS, RUNNING_HEALTH_INTERVAL_SECS,
};
use k8s_openapi::api::apps::v1::Deployment;
use osio_dispatcher::Action;
use osio_gateway::ClusterGateway;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Default mean (seconds) used if an annotation that should already be
/// present is somehow missing — defensive only, never exercised by a
/// deployment this controller created itself.
const FALLBACK_MEAN_SECS: f64 = 60.0;

fn annotation_f64(annotations: &BTreeMap<String, String>, key: &str, fallback: f64) -> f64 {
    annotations.get(key).and_then(|v| v.parse().ok()).unwrap_or(fallback)
}

fn clamp_duration(draw: f64, workaround_min_runtime: bool) -> f64 {
    if workaround_min_runtime {
        draw.max(INITIAL_HEALTH_INTERVAL_SECS)
    } else {
        draw
    }
}

fn annotation_patch(entries: &[(&str, String)]) -> serde_json::Value {
    let mut annotations = serde_json::Map::new();
    for (k, v) in entries {
        annotations.insert((*k).to_string(), serde_json::Value::String(v.clone()));
    }
    serde_json::json!({ "metadata": { "annotations": annotations } })
}

/// One lifecycle tick for a single workload deployment, self-rescheduling
/// via the returned follow-on (spec.md §4.7, §3 "Workload instance").
pub struct Lifecycle<G, C> {
    namespace: String,
    name: String,
    gateway: Arc<G>,
    clock: C,
    workaround_min_runtime: bool,
    when: f64,
}

impl<G, C: Clock> Lifecycle<G, C> {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        gateway: Arc<G>,
        clock: C,
        workaround_min_runtime: bool,
        when: f64,
    ) -> Self {
        Self { namespace: namespace.into(), name: name.into(), gateway, clock, workaround_min_runtime, when }
    }
}

#[async_trait::async_trait]
impl<G: ClusterGateway + 'static, C: Clock> Action for Lifecycle<G, C> {
    fn when(&self) -> f64 {
        self.when
    }

    async fn execute(self: Box<Self>) -> anyhow::Result<Vec<Box<dyn Action>>> {
        let Some(deployment) = self.gateway.get_deployment(&self.namespace, &self.name).await.map_err(LifecycleError::from)? else {
            tracing::debug!(namespace = %self.namespace, name = %self.name, "lifecycle tick on a deployment that no longer exists");
            return Ok(Vec::new());
        };

        let annotations = deployment.metadata.annotations.clone().unwrap_or_default();
        let now = self.clock.now();

        let Some(raw_next_action) = annotations.get(ANNOTATION_NEXT_ACTION) else {
            return self.first_tick(&annotations, now).await;
        };

        let next_time = annotation_f64(&annotations, ANNOTATION_NEXT_TIME, now);
        if next_time > now {
            return Ok(vec![Box::new(Lifecycle {
                namespace: self.namespace.clone(),
                name: self.name.clone(),
                gateway: self.gateway.clone(),
                clock: self.clock.clone(),
                workaround_min_runtime: self.workaround_min_runtime,
                when: next_time,
            })]);
        }

        let next_action: NextAction = raw_next_action.parse().map_err(LifecycleError::from)?;
        match next_action {
            NextAction::Destroy => self.do_destroy(&annotations).await,
            NextAction::Health => self.do_health(&deployment, &annotations, now).await,
            NextAction::Idle => self.do_idle(&deployment, &annotations, now).await,
        }
    }
}

impl<G: ClusterGateway + 'static, C: Clock> Lifecycle<G, C> {
    async fn first_tick(
        &self,
        annotations: &BTreeMap<String, String>,
        now: f64,
    ) -> anyhow::Result<Vec<Box<dyn Action>>> {
        let destroy_at = annotation_f64(annotations, ANNOTATION_DESTROY_AT, now);
        let idle_mean = annotation_f64(annotations, ANNOTATION_IDLE, FALLBACK_MEAN_SECS);
        let idle_draw = {
            let mut rng = rand::thread_rng();
            clamp_duration(osio_core::exponential_draw(&mut rng, idle_mean), self.workaround_min_runtime)
        };
        let idle_at = now + idle_draw;
        let health_at = now + INITIAL_HEALTH_INTERVAL_SECS;

        let (next_time, next_action) = next_action_for(destroy_at, idle_at, health_at);
        let patch = annotation_patch(&[
            (ANNOTATION_IDLE_AT, idle_at.to_string()),
            (ANNOTATION_HEALTH_AT, health_at.to_string()),
            (ANNOTATION_NEXT_TIME, next_time.to_string()),
            (ANNOTATION_NEXT_ACTION, next_action.to_string()),
        ]);
        self.gateway.patch_deployment(&self.namespace, &self.name, patch).await.map_err(LifecycleError::from)?;

        Ok(vec![self.reschedule(next_time)])
    }

    async fn do_destroy(&self, annotations: &BTreeMap<String, String>) -> anyhow::Result<Vec<Box<dyn Action>>> {
        self.gateway.delete_deployment(&self.namespace, &self.name).await.map_err(LifecycleError::from)?;
        if let Some(pvc) = annotations.get(ANNOTATION_PVC) {
            self.gateway.delete_pvc(&self.namespace, pvc).await.map_err(LifecycleError::from)?;
        }
        tracing::info!(namespace = %self.namespace, name = %self.name, "destroyed workload instance");
        Ok(Vec::new())
    }

    async fn do_health(
        &self,
        deployment: &Deployment,
        annotations: &BTreeMap<String, String>,
        now: f64,
    ) -> anyhow::Result<Vec<Box<dyn Action>>> {
        let wanted = deployment.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1);
        let ready = deployment.status.as_ref().and_then(|s| s.ready_replicas).unwrap_or(0);
        if wanted == 1 && ready != 1 {
            return Err(LifecycleError::UnhealthyDeployment {
                namespace: self.namespace.clone(),
                name: self.name.clone(),
            }
            .into());
        }

        let destroy_at = annotation_f64(annotations, ANNOTATION_DESTROY_AT, now);
        let idle_at = annotation_f64(annotations, ANNOTATION_IDLE_AT, now);
        let health_at = now + RUNNING_HEALTH_INTERVAL_SECS;

        let (next_time, next_action) = next_action_for(destroy_at, idle_at, health_at);
        let patch = annotation_patch(&[
            (ANNOTATION_HEALTH_AT, health_at.to_string()),
            (ANNOTATION_NEXT_TIME, next_time.to_string()),
            (ANNOTATION_NEXT_ACTION, next_action.to_string()),
        ]);
        self.gateway.patch_deployment(&self.namespace, &self.name, patch).await.map_err(LifecycleError::from)?;

        Ok(vec![self.reschedule(next_time)])
    }

    async fn do_idle(
        &self,
        deployment: &Deployment,
        annotations: &BTreeMap<String, String>,
        now: f64,
    ) -> anyhow::Result<Vec<Box<dyn Action>>> {
        let current_replicas = deployment.spec.as_ref().and_then(|s| s.replicas).unwrap_or(0);
        let new_replicas = if current_replicas == 0 { 1 } else { 0 };

        let destroy_at = annotation_f64(annotations, ANNOTATION_DESTROY_AT, now);
        let (idle_at, health_at) = {
            let mut rng = rand::thread_rng();
            if new_replicas == 1 {
                let active_mean = annotation_f64(annotations, ANNOTATION_ACTIVE, FALLBACK_MEAN_SECS);
                let draw = clamp_duration(osio_core::exponential_draw(&mut rng, active_mean), self.workaround_min_runtime);
                (now + draw, now + INITIAL_HEALTH_INTERVAL_SECS)
            } else {
                let idle_mean = annotation_f64(annotations, ANNOTATION_IDLE, FALLBACK_MEAN_SECS);
                let draw = clamp_duration(osio_core::exponential_draw(&mut rng, idle_mean), self.workaround_min_runtime);
                (now + draw, now + RUNNING_HEALTH_INTERVAL_SECS)
            }
        };

        let (next_time, next_action) = next_action_for(destroy_at, idle_at, health_at);
        let mut patch = annotation_patch(&[
            (ANNOTATION_IDLE_AT, idle_at.to_string()),
            (ANNOTATION_HEALTH_AT, health_at.to_string()),
            (ANNOTATION_NEXT_TIME, next_time.to_string()),
            (ANNOTATION_NEXT_ACTION, next_action.to_string()),
        ]);
        patch["spec"] = serde_json::json!({ "replicas": new_replicas });
        self.gateway.patch_deployment(&self.namespace, &self.name, patch).await.map_err(LifecycleError::from)?;

        Ok(vec![self.reschedule(next_time)])
    }

    fn reschedule(&self, when: f64) -> Box<dyn Action> {
        Box::new(Lifecycle {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            gateway: self.gateway.clone(),
            clock: self.clock.clone(),
            workaround_min_runtime: self.workaround_min_runtime,
            when,
        })
    }
}
