// SPDX-License-Identifier: MIT

//! Entry point for the chaos loop: builds the health oracle, registers the
//! `DeletePod` fault prototype against the Ceph OSDs, and drives
//! `ChaosLoop::run_iteration` until a fault escapes (spec.md §4.4–§4.5, §6).

use std::sync::Arc;

use clap::Parser;
use osio_cli::{init_tracing, ChaosArgs};
use osio_core::SystemClock;
use osio_fault::{ChaosLoop, ChaosLoopConfig, DeletePodType};
use osio_gateway::KubeGateway;
use osio_health::{CephHealthOracle, HealthOracle};

/// Label selector for the one standard fault prototype this binary
/// registers: OSD pods, the component spec.md §4.4 uses as its running
/// example.
const OSD_SELECTOR: &str = "app=rook-ceph-osd";

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let args = ChaosArgs::parse();
    init_tracing();

    match run(&args).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "osio-chaos exiting with a fatal error");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run(args: &ChaosArgs) -> anyhow::Result<()> {
    let gateway = Arc::new(KubeGateway::try_default().await?);
    let clock = SystemClock::new();

    let health: Arc<dyn HealthOracle> = Arc::new(CephHealthOracle::new(
        gateway.clone(),
        clock.clone(),
        args.ocs_namespace.clone(),
        args.cephcluster_name(),
    ));

    let prototypes: Vec<Box<dyn osio_fault::FailureType>> =
        vec![Box::new(DeletePodType::new(gateway.clone(), health.clone(), args.ocs_namespace.clone(), OSD_SELECTOR))];

    let config = ChaosLoopConfig {
        mttf: args.mttf,
        additional_failure_probability: args.additional_failure,
        mitigation_timeout: args.mitigation_timeout,
        check_interval: args.check_interval,
    };

    let chaos_loop = ChaosLoop::new(prototypes, health, clock, config);
    let mut stack = Vec::new();
    loop {
        chaos_loop.run_iteration(&mut stack).await?;
    }
}
