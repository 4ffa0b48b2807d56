//! Must-gather style diagnostics collection on a fatal error
//! (SPEC_FULL.md §11). Explicitly outside the core: shells out to `oc`,
//! never touched by `osio-workload`/`osio-fault`/`osio-dispatcher` directly.

use std::path::Path;

/// Run `oc adm must-gather` (plain and OCS-flavored) plus an image-version
/// scrape into `log_dir`, logging failures rather than propagating them —
/// diagnostics collection is best-effort and must never mask the original
/// fatal error.
pub async fn gather_diagnostics(oc: &str, ocs_namespace: &str, log_dir: &Path) {
    if let Err(e) = tokio::fs::create_dir_all(log_dir).await {
        tracing::warn!(dir = %log_dir.display(), error = %e, "could not create log directory");
        return;
    }

    run_gather(oc, log_dir, "must-gather.log", &["adm", "must-gather"]).await;
    run_gather(
        oc,
        log_dir,
        "must-gather-ocs.log",
        &[
            "adm",
            "must-gather",
            "--image=quay.io/ocs-dev/ocs-must-gather",
            "-n",
            ocs_namespace,
        ],
    )
    .await;
    run_gather(oc, log_dir, "images.log", &["adm", "release", "info"]).await;
}

async fn run_gather(oc: &str, log_dir: &Path, file_name: &str, args: &[&str]) {
    let output = match tokio::process::Command::new(oc).args(args).current_dir(log_dir).output().await {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!(cmd = %oc, args = ?args, error = %e, "diagnostics command failed to spawn");
            return;
        }
    };

    let path = log_dir.join(file_name);
    let mut contents = output.stdout;
    contents.extend_from_slice(&output.stderr);
    if let Err(e) = tokio::fs::write(&path, &contents).await {
        tracing::warn!(path = %path.display(), error = %e, "could not write diagnostics output");
    } else {
        tracing::info!(path = %path.display(), success = output.status.success(), "collected diagnostics");
    }
}
