//! Clock abstraction for testable wall-clock scheduling.
//!
//! The dispatcher (`osio-dispatcher`) only ever asks a [`Clock`] for "now"
//! and "sleep until this deadline". [`SystemClock`] sleeps for real;
//! [`FakeClock`] advances instantly, so invariant tests can exercise
//! thousands of scheduled actions without waiting on a real timer.

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A source of wall-clock time, expressed as seconds since the Unix epoch.
///
/// `when` values throughout this workspace (see `osio-dispatcher::Action`)
/// are `f64` seconds since epoch, matching the Python original's
/// `time.time()`.
#[async_trait::async_trait]
pub trait Clock: Clone + Send + Sync + 'static {
    /// Current time, in seconds since the Unix epoch.
    fn now(&self) -> f64;

    /// Block (or, for fakes, fast-forward) until `when` has arrived.
    async fn sleep_until(&self, when: f64);
}

/// Real system clock; sleeps using `tokio::time::sleep`.
#[derive(Clone, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64()
    }

    async fn sleep_until(&self, when: f64) {
        let delta = when - self.now();
        if delta > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(delta)).await;
        }
    }
}

/// Fake clock for deterministic tests.
///
/// `sleep_until` never blocks; it simply advances the clock to `when` (if
/// `when` is in the future) and returns immediately. This preserves the
/// dispatcher's ordering behavior while letting tests run instantly.
#[derive(Clone)]
pub struct FakeClock {
    now: Arc<Mutex<f64>>,
}

impl FakeClock {
    pub fn new(start: f64) -> Self {
        Self { now: Arc::new(Mutex::new(start)) }
    }

    pub fn advance(&self, secs: f64) {
        let mut g = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *g += secs;
    }

    pub fn set(&self, at: f64) {
        let mut g = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *g = at;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[async_trait::async_trait]
impl Clock for FakeClock {
    fn now(&self) -> f64 {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn sleep_until(&self, when: f64) {
        let mut g = self.now.lock().unwrap_or_else(|e| e.into_inner());
        if when > *g {
            *g = when;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_now_is_plausible() {
        let c = SystemClock::new();
        let now = c.now();
        assert!(now > 1_700_000_000.0);
    }

    #[tokio::test]
    async fn fake_clock_advances_to_future_deadline() {
        let c = FakeClock::new(100.0);
        c.sleep_until(150.0).await;
        assert_eq!(c.now(), 150.0);
    }

    #[tokio::test]
    async fn fake_clock_does_not_rewind() {
        let c = FakeClock::new(100.0);
        c.sleep_until(50.0).await;
        assert_eq!(c.now(), 100.0);
    }
}
