//! Plain, `clap`-independent configuration structs (SPEC_FULL.md §10):
//! CLI flag parsing lives in `osio-cli`; these are the values it produces,
//! kept here so tests can build configs directly without parsing argv.

use std::fmt;
use std::str::FromStr;

/// PVC access mode (spec.md §6 `--accessmode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadWriteOnce,
    ReadWriteMany,
}

impl AccessMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMode::ReadWriteOnce => "ReadWriteOnce",
            AccessMode::ReadWriteMany => "ReadWriteMany",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when `--accessmode` holds neither `RWO` nor `RWM`/`RWX`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown access mode: {0:?} (expected RWO or RWM)")]
pub struct UnknownAccessMode(pub String);

impl FromStr for AccessMode {
    type Err = UnknownAccessMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RWO" | "ReadWriteOnce" => Ok(AccessMode::ReadWriteOnce),
            "RWM" | "RWX" | "ReadWriteMany" => Ok(AccessMode::ReadWriteMany),
            other => Err(UnknownAccessMode(other.to_string())),
        }
    }
}

/// Tuning for one workload generator run (spec.md §6.2 CLI table).
///
/// Defaults match `examples/original_source/workload_runner.py`.
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    pub namespace: String,
    pub storage_class: String,
    pub access_mode: AccessMode,
    pub interarrival_secs: f64,
    pub lifetime_secs: f64,
    pub active_secs: f64,
    pub idle_secs: f64,
    pub image: String,
    /// Opaque in-pod workload knobs, passed through as container env vars
    /// only (spec.md §6.3) — never interpreted by this crate.
    pub kernel_slots: String,
    pub kernel_untar: String,
    pub kernel_rm: String,
    /// Clamp exponential draws for idle/active duration to a lower bound of
    /// `INITIAL_HEALTH_INTERVAL_SECS` (spec.md §4.7, "Workaround clamp").
    pub workaround_min_runtime: bool,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            namespace: "ocs-monkey".to_string(),
            storage_class: "csi-rbd".to_string(),
            access_mode: AccessMode::ReadWriteOnce,
            interarrival_secs: 10.0,
            lifetime_secs: 300.0,
            active_secs: 60.0,
            idle_secs: 30.0,
            image: "busybox".to_string(),
            kernel_slots: String::new(),
            kernel_untar: String::new(),
            kernel_rm: String::new(),
            workaround_min_runtime: false,
        }
    }
}
