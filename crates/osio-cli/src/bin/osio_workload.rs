// SPDX-License-Identifier: MIT

//! Entry point for the workload generator: bootstraps the namespace,
//! resumes already-running workload instances, seeds the dispatcher with a
//! fresh `Creator`, and drains the queue (spec.md §4.6–§4.7, §6).

use std::sync::Arc;

use clap::Parser;
use osio_cli::{gather_diagnostics, init_tracing, WorkloadArgs};
use osio_core::{SystemClock, WorkloadConfig};
use osio_dispatcher::Dispatcher;
use osio_gateway::KubeGateway;
use osio_workload::{resume, Creator, WatcherPool};

#[tokio::main]
async fn main() {
    let args = WorkloadArgs::parse();
    init_tracing();

    if let Err(e) = run(&args).await {
        tracing::error!(error = %e, "osio-workload exiting with a fatal error");

        if let Some(log_dir) = &args.log_dir {
            gather_diagnostics(&args.oc, &args.ocs_namespace, log_dir).await;
        }

        if args.sleep_on_error {
            tracing::warn!("--sleep-on-error set; parking forever for postmortem");
            std::future::pending::<()>().await;
        }

        std::process::exit(1);
    }
}

async fn run(args: &WorkloadArgs) -> anyhow::Result<()> {
    let config: WorkloadConfig = args.into();
    let gateway = Arc::new(KubeGateway::try_default().await?);
    gateway.ensure_namespace(&config.namespace).await?;

    let clock = SystemClock::new();
    let mut dispatcher = Dispatcher::new(clock.clone());

    let resumed = resume(gateway.clone(), clock.clone(), &config.namespace, config.workaround_min_runtime).await?;
    tracing::info!(count = resumed.len(), "resumed existing workload instances");
    dispatcher.push_all(resumed);

    let watch_pool = WatcherPool::new();
    dispatcher.push(Box::new(Creator::new(gateway, clock.clone(), Arc::new(config), watch_pool, clock.now())));

    dispatcher.run().await
}
