//! The workload factory (spec.md §4.6): builds a deployment/PVC pair for a
//! fresh workload instance.

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, EnvVar, ExecAction, PersistentVolumeClaim, PersistentVolumeClaimSpec, PodSpec,
    PodTemplateSpec, Probe, ResourceRequirements, Volume, VolumeMount, PersistentVolumeClaimVolumeSource,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use osio_core::{WorkloadConfig, CONTROLLER_LABEL_KEY, CONTROLLER_LABEL_VALUE};
use rand::Rng;
use std::collections::BTreeMap;

/// Label carrying the per-instance unique id, so a deployment's selector and
/// pod template agree without needing the deployment name (spec.md §4.6).
pub const DEPLOYMENT_ID_LABEL: &str = "deployment-id";

const KERNEL_UNTAR_PVC_SIZE_GI: u32 = 3;
const DEFAULT_PVC_SIZE_GI: u32 = 1;

fn labels(uid: &str) -> BTreeMap<String, String> {
    let mut m = BTreeMap::new();
    m.insert(CONTROLLER_LABEL_KEY.to_string(), CONTROLLER_LABEL_VALUE.to_string());
    m.insert(DEPLOYMENT_ID_LABEL.to_string(), uid.to_string());
    m
}

/// Build the deployment manifest for workload instance `uid`. Annotations
/// are intentionally left unset here — the Creator action stamps them
/// (spec.md §4.6: "annotations are stamped by the Creator, not the factory").
pub fn build_deployment(uid: &str, config: &WorkloadConfig) -> Deployment {
    let mut selector = LabelSelector::default();
    let mut match_labels = BTreeMap::new();
    match_labels.insert(DEPLOYMENT_ID_LABEL.to_string(), uid.to_string());
    selector.match_labels = Some(match_labels);

    let container = Container {
        name: "workload".to_string(),
        image: Some(config.image.clone()),
        env: Some(vec![
            EnvVar { name: "OSIO_KERNEL_SLOTS".to_string(), value: Some(config.kernel_slots.clone()), ..Default::default() },
            EnvVar { name: "OSIO_KERNEL_UNTAR".to_string(), value: Some(config.kernel_untar.clone()), ..Default::default() },
            EnvVar { name: "OSIO_KERNEL_RM".to_string(), value: Some(config.kernel_rm.clone()), ..Default::default() },
        ]),
        volume_mounts: Some(vec![VolumeMount {
            name: "data".to_string(),
            mount_path: "/data".to_string(),
            ..Default::default()
        }]),
        readiness_probe: Some(Probe {
            exec: Some(ExecAction { command: Some(vec!["/health.sh".to_string()]) }),
            initial_delay_seconds: Some(5),
            period_seconds: Some(10),
            ..Default::default()
        }),
        ..Default::default()
    };

    let pod_spec = PodSpec {
        containers: vec![container],
        volumes: Some(vec![Volume {
            name: "data".to_string(),
            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                claim_name: pvc_name(uid),
                ..Default::default()
            }),
            ..Default::default()
        }]),
        ..Default::default()
    };

    Deployment {
        metadata: ObjectMeta {
            name: Some(deployment_name(uid)),
            labels: Some(labels(uid)),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector,
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta { labels: Some(labels(uid)), ..Default::default() }),
                spec: Some(pod_spec),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Build the PVC manifest for workload instance `uid`. `backs_kernel_untar`
/// selects the 3GiB size used by the kernel-untar workload vs. the 1GiB
/// default (spec.md §4.6).
pub fn build_pvc(uid: &str, config: &WorkloadConfig, backs_kernel_untar: bool) -> PersistentVolumeClaim {
    let size_gi = if backs_kernel_untar { KERNEL_UNTAR_PVC_SIZE_GI } else { DEFAULT_PVC_SIZE_GI };
    let mut requests = BTreeMap::new();
    requests.insert("storage".to_string(), Quantity(format!("{size_gi}Gi")));

    PersistentVolumeClaim {
        metadata: ObjectMeta { name: Some(pvc_name(uid)), labels: Some(labels(uid)), ..Default::default() },
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec![config.access_mode.as_str().to_string()]),
            storage_class_name: Some(config.storage_class.clone()),
            resources: Some(ResourceRequirements { requests: Some(requests), ..Default::default() }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn deployment_name(uid: &str) -> String {
    format!("osio-worker-{uid}")
}

pub fn pvc_name(uid: &str) -> String {
    format!("pvc-{uid}")
}

/// A freshly minted deployment/PVC pair plus the `uid` that ties them
/// together (spec.md §4.6).
pub struct WorkloadManifests {
    pub uid: String,
    pub deployment: Deployment,
    pub pvc: PersistentVolumeClaim,
}

pub fn new_workload_manifests(config: &WorkloadConfig, rng: &mut impl Rng, backs_kernel_untar: bool) -> WorkloadManifests {
    let uid = osio_core::new_uid(rng);
    let deployment = build_deployment(&uid, config);
    let pvc = build_pvc(&uid, config, backs_kernel_untar);
    WorkloadManifests { uid, deployment, pvc }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployment_has_single_replica_and_matching_selector() {
        let config = WorkloadConfig::default();
        let d = build_deployment("000000042", &config);
        assert_eq!(d.metadata.name.as_deref(), Some("osio-worker-000000042"));
        let spec = d.spec.unwrap();
        assert_eq!(spec.replicas, Some(1));
        assert_eq!(
            spec.selector.match_labels.as_ref().and_then(|m| m.get(DEPLOYMENT_ID_LABEL)),
            Some(&"000000042".to_string())
        );
        let pod_labels = spec.template.metadata.unwrap().labels.unwrap();
        assert_eq!(pod_labels.get(DEPLOYMENT_ID_LABEL), Some(&"000000042".to_string()));
    }

    #[test]
    fn readiness_probe_uses_spec_timing() {
        let config = WorkloadConfig::default();
        let d = build_deployment("1", &config);
        let probe = d.spec.unwrap().template.spec.unwrap().containers[0].readiness_probe.clone().unwrap();
        assert_eq!(probe.initial_delay_seconds, Some(5));
        assert_eq!(probe.period_seconds, Some(10));
    }

    #[test]
    fn pvc_size_depends_on_kernel_untar_flag() {
        let config = WorkloadConfig::default();
        let small = build_pvc("a", &config, false);
        let large = build_pvc("a", &config, true);
        let size = |p: &PersistentVolumeClaim| {
            p.spec.as_ref().unwrap().resources.as_ref().unwrap().requests.as_ref().unwrap()["storage"].0.clone()
        };
        assert_eq!(size(&small), "1Gi");
        assert_eq!(size(&large), "3Gi");
    }

    #[test]
    fn new_workload_manifests_ties_uid_across_both_objects() {
        let config = WorkloadConfig::default();
        let mut rng = rand::thread_rng();
        let m = new_workload_manifests(&config, &mut rng, false);
        assert_eq!(m.deployment.metadata.name.as_deref(), Some(deployment_name(&m.uid).as_str()));
        assert_eq!(m.pvc.metadata.name.as_deref(), Some(pvc_name(&m.uid).as_str()));
    }
}
