//! Detached pod start/stop watchers (spec.md §4.8): pure observability,
//! never feed back into the scheduler. Bounded to at most 100 concurrent
//! watches (spec.md §5, "Parallel observers").

use osio_gateway::ClusterGateway;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

const WATCH_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_CONCURRENT_WATCHES: usize = 100;

/// Shared concurrency bound for all start/stop watchers spawned by one
/// process. Cloned cheaply (an `Arc` around the semaphore) and handed to
/// every Creator tick.
#[derive(Clone)]
pub struct WatcherPool {
    semaphore: Arc<Semaphore>,
}

impl WatcherPool {
    pub fn new() -> Self {
        Self { semaphore: Arc::new(Semaphore::new(MAX_CONCURRENT_WATCHES)) }
    }
}

impl Default for WatcherPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn a detached task that logs how long a pod matching `label_selector`
/// took to reach `Running`, or returns silently if it was deleted first.
pub fn spawn_pod_start_watcher<G: ClusterGateway + 'static>(
    gateway: Arc<G>,
    pool: WatcherPool,
    namespace: String,
    label_selector: String,
) {
    tokio::spawn(async move {
        let Ok(_permit) = pool.semaphore.acquire_owned().await else { return };
        let started = Instant::now();
        match gateway.watch_pod_running(&namespace, &label_selector, WATCH_TIMEOUT).await {
            Ok(true) => tracing::info!(
                namespace, selector = %label_selector, elapsed_ms = started.elapsed().as_millis() as u64,
                "pod reached Running"
            ),
            Ok(false) => tracing::debug!(
                namespace, selector = %label_selector,
                "pod start watch ended without reaching Running (deleted or timed out)"
            ),
            Err(e) => tracing::warn!(namespace, selector = %label_selector, error = %e, "pod start watch failed"),
        }
    });
}

/// Spawn a detached task that logs how long a pod matching `label_selector`
/// took to be deleted.
pub fn spawn_pod_stop_watcher<G: ClusterGateway + 'static>(
    gateway: Arc<G>,
    pool: WatcherPool,
    namespace: String,
    label_selector: String,
) {
    tokio::spawn(async move {
        let Ok(_permit) = pool.semaphore.acquire_owned().await else { return };
        let started = Instant::now();
        match gateway.watch_pod_deleted(&namespace, &label_selector, WATCH_TIMEOUT).await {
            Ok(true) => tracing::info!(
                namespace, selector = %label_selector, elapsed_ms = started.elapsed().as_millis() as u64,
                "pod deleted"
            ),
            Ok(false) => tracing::debug!(namespace, selector = %label_selector, "pod stop watch timed out"),
            Err(e) => tracing::warn!(namespace, selector = %label_selector, error = %e, "pod stop watch failed"),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use osio_gateway::FakeGateway;

    #[tokio::test]
    async fn start_watcher_does_not_panic_against_a_fake_gateway() {
        let gw = Arc::new(FakeGateway::new());
        let pool = WatcherPool::new();
        spawn_pod_start_watcher(gw, pool, "ns".to_string(), "deployment-id=1".to_string());
        tokio::task::yield_now().await;
    }

    #[tokio::test]
    async fn pool_bounds_concurrent_permits() {
        let pool = WatcherPool::new();
        let mut permits = Vec::new();
        for _ in 0..MAX_CONCURRENT_WATCHES {
            permits.push(pool.semaphore.clone().acquire_owned().await.unwrap());
        }
        assert_eq!(pool.semaphore.available_permits(), 0);
    }
}
