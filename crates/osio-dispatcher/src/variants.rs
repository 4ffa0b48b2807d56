//! The two stock [`Action`] variants from spec.md §4.2.

use crate::Action;
use std::sync::Arc;

/// Executes `f()` once; returns no follow-ons.
pub struct OneShot {
    when: f64,
    action: Box<dyn FnOnce() + Send + Sync>,
}

impl OneShot {
    pub fn new(when: f64, action: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self { when, action: Box::new(action) }
    }
}

#[async_trait::async_trait]
impl Action for OneShot {
    fn when(&self) -> f64 {
        self.when
    }

    async fn execute(self: Box<Self>) -> anyhow::Result<Vec<Box<dyn Action>>> {
        (self.action)();
        Ok(Vec::new())
    }
}

/// Executes `f()`; if `f()` returns `true`, re-enqueues itself at
/// `now + interval` (using the action's own `when` plus `interval`, so
/// periods do not drift if a tick runs late); otherwise terminates.
pub struct Periodic {
    when: f64,
    interval: f64,
    action: Arc<dyn Fn() -> bool + Send + Sync>,
}

impl Periodic {
    /// Schedule the first tick at `first_when`; subsequent ticks land
    /// `interval` seconds after the previous scheduled (not actual) time.
    pub fn new(first_when: f64, interval: f64, action: Arc<dyn Fn() -> bool + Send + Sync>) -> Self {
        Self { when: first_when, interval, action }
    }

    pub fn starting_in(
        clock_now: f64,
        interval: f64,
        action: Arc<dyn Fn() -> bool + Send + Sync>,
    ) -> Self {
        Self::new(clock_now + interval, interval, action)
    }
}

#[async_trait::async_trait]
impl Action for Periodic {
    fn when(&self) -> f64 {
        self.when
    }

    async fn execute(self: Box<Self>) -> anyhow::Result<Vec<Box<dyn Action>>> {
        if (self.action)() {
            let next = Periodic::new(self.when + self.interval, self.interval, self.action.clone());
            Ok(vec![Box::new(next)])
        } else {
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dispatcher;
    use osio_core::FakeClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Invariant 3 — a Periodic with action `f` returning true k times
    /// produces exactly k+1 invocations.
    #[tokio::test]
    async fn periodic_self_repetition_k_plus_one_invocations() {
        let calls = Arc::new(AtomicUsize::new(0));
        let k = 4usize;
        let c = calls.clone();
        let action: Arc<dyn Fn() -> bool + Send + Sync> = Arc::new(move || {
            let n = c.fetch_add(1, Ordering::SeqCst) + 1;
            n <= k
        });

        let mut d = Dispatcher::new(FakeClock::new(0.0));
        d.push(Box::new(Periodic::new(0.0, 1.0, action)));
        d.run().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), k + 1);
    }
}
