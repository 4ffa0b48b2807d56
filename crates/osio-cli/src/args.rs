//! `clap` flag surfaces for both binaries (spec.md §6, SPEC_FULL.md §6.2).

use clap::Parser;
use osio_core::{AccessMode, WorkloadConfig};
use std::path::PathBuf;

/// `osio-workload` — the workload generator.
#[derive(Parser, Debug)]
#[command(name = "osio-workload", about = "Generate and retire synthetic workload instances")]
pub struct WorkloadArgs {
    /// Target namespace for workload instances.
    #[arg(long, default_value = "ocs-monkey")]
    pub namespace: String,

    /// Storage class backing each workload's PVC.
    #[arg(long = "storageclass", default_value = "csi-rbd")]
    pub storage_class: String,

    /// PVC access mode (RWO or RWM).
    #[arg(long = "accessmode", default_value = "RWO")]
    pub access_mode: AccessMode,

    /// Mean seconds between new workload instances.
    #[arg(long = "osio-interarrival", default_value_t = 10.0)]
    pub interarrival: f64,

    /// Mean seconds a workload instance lives before destruction.
    #[arg(long = "osio-lifetime", default_value_t = 300.0)]
    pub lifetime: f64,

    /// Mean seconds a workload instance spends in its active phase.
    #[arg(long = "osio-active-time", default_value_t = 60.0)]
    pub active_time: f64,

    /// Mean seconds a workload instance spends in its idle phase.
    #[arg(long = "osio-idle-time", default_value_t = 30.0)]
    pub idle_time: f64,

    /// Opaque in-pod workload knob, passed through as an env var.
    #[arg(long = "osio-kernel-slots", default_value = "")]
    pub kernel_slots: String,

    /// Opaque in-pod workload knob, passed through as an env var.
    #[arg(long = "osio-kernel-untar", default_value = "")]
    pub kernel_untar: String,

    /// Opaque in-pod workload knob, passed through as an env var.
    #[arg(long = "osio-kernel-rm", default_value = "")]
    pub kernel_rm: String,

    /// Container image for each workload instance.
    #[arg(long = "osio-image", default_value = "busybox")]
    pub image: String,

    /// Directory to write collected diagnostics into on a fatal error.
    #[arg(long = "log-dir")]
    pub log_dir: Option<PathBuf>,

    /// Path to the `oc` binary used for diagnostics collection.
    #[arg(long, default_value = "oc")]
    pub oc: String,

    /// Namespace the SUT (Ceph/OCS) lives in; scoped for must-gather.
    #[arg(long = "ocs-namespace", default_value = "rook-ceph")]
    pub ocs_namespace: String,

    /// Park forever after collecting diagnostics instead of exiting.
    #[arg(long = "sleep-on-error")]
    pub sleep_on_error: bool,

    /// Clamp active/idle draws to at least the initial health-check
    /// interval, avoiding a readiness-probe race on very short draws.
    #[arg(long = "osio-workaround-min-runtime")]
    pub workaround_min_runtime: bool,
}

impl From<&WorkloadArgs> for WorkloadConfig {
    fn from(a: &WorkloadArgs) -> Self {
        WorkloadConfig {
            namespace: a.namespace.clone(),
            storage_class: a.storage_class.clone(),
            access_mode: a.access_mode,
            interarrival_secs: a.interarrival,
            lifetime_secs: a.lifetime,
            active_secs: a.active_time,
            idle_secs: a.idle_time,
            image: a.image.clone(),
            kernel_slots: a.kernel_slots.clone(),
            kernel_untar: a.kernel_untar.clone(),
            kernel_rm: a.kernel_rm.clone(),
            workaround_min_runtime: a.workaround_min_runtime,
        }
    }
}

/// `osio-chaos` — the fault-injection loop.
#[derive(Parser, Debug)]
#[command(name = "osio-chaos", about = "Continuously inject and mitigate faults against the SUT")]
pub struct ChaosArgs {
    /// Mean time to failure, in seconds.
    #[arg(long, default_value_t = 300.0)]
    pub mttf: f64,

    /// Probability of compounding a second fault instead of awaiting
    /// mitigation of the first.
    #[arg(long = "additional-failure", default_value_t = 0.1)]
    pub additional_failure: f64,

    /// Upper bound, in seconds, on how long to wait for the SUT to recover.
    #[arg(long = "mitigation-timeout", default_value_t = 900.0)]
    pub mitigation_timeout: f64,

    /// Steady-state re-check period, in seconds.
    #[arg(long = "check-interval", default_value_t = 30.0)]
    pub check_interval: f64,

    /// Namespace the SUT (Ceph/OCS) lives in.
    #[arg(long = "ocs-namespace", default_value = "rook-ceph")]
    pub ocs_namespace: String,

    /// Name of the CephCluster custom resource. Defaults to the SUT
    /// namespace, matching the original's `await_ceph_healthy` call.
    #[arg(long = "cephcluster-name")]
    pub cephcluster_name: Option<String>,
}

impl ChaosArgs {
    pub fn cephcluster_name(&self) -> String {
        self.cephcluster_name.clone().unwrap_or_else(|| self.ocs_namespace.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn workload_args_defaults_match_spec() {
        WorkloadArgs::command().debug_assert();
        let args = WorkloadArgs::parse_from(["osio-workload"]);
        assert_eq!(args.namespace, "ocs-monkey");
        assert_eq!(args.storage_class, "csi-rbd");
        assert_eq!(args.access_mode, AccessMode::ReadWriteOnce);
        assert_eq!(args.interarrival, 10.0);
        assert_eq!(args.lifetime, 300.0);
        assert_eq!(args.active_time, 60.0);
        assert_eq!(args.idle_time, 30.0);
        assert_eq!(args.image, "busybox");
        assert!(!args.sleep_on_error);
    }

    #[test]
    fn chaos_args_defaults_match_spec() {
        ChaosArgs::command().debug_assert();
        let args = ChaosArgs::parse_from(["osio-chaos"]);
        assert_eq!(args.mttf, 300.0);
        assert_eq!(args.additional_failure, 0.1);
        assert_eq!(args.mitigation_timeout, 900.0);
        assert_eq!(args.check_interval, 30.0);
        assert_eq!(args.ocs_namespace, "rook-ceph");
        assert_eq!(args.cephcluster_name(), "rook-ceph");
    }

    #[test]
    fn chaos_args_cephcluster_name_overridable() {
        let args = ChaosArgs::parse_from(["osio-chaos", "--ocs-namespace", "ceph-ns", "--cephcluster-name", "my-cluster"]);
        assert_eq!(args.cephcluster_name(), "my-cluster");
    }
}
