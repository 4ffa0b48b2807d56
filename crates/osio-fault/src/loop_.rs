//! The fault-injection loop: stack of outstanding faults, compounding,
//! mitigation, and the memoryless `await_next_failure` delay (spec.md §4.5).

use crate::{get_failure, Failure, FailureType, FaultError};
use osio_core::Clock;
use osio_gateway::ClusterError;
use osio_health::HealthOracle;
use rand::Rng;
use std::sync::Arc;

/// Tuning knobs for one [`ChaosLoop`] (spec.md §4.5).
#[derive(Debug, Clone, Copy)]
pub struct ChaosLoopConfig {
    /// Mean time to failure, in seconds.
    pub mttf: f64,
    /// Probability, once a fault is pushed this iteration, of compounding
    /// immediately instead of awaiting mitigation.
    pub additional_failure_probability: f64,
    pub mitigation_timeout: f64,
    pub check_interval: f64,
}

/// Drives the stack of outstanding faults against one set of prototypes.
///
/// `S` (the LIFO stack) lives in memory only, owned by this loop — if the
/// process dies mid-iteration, in-flight faults remain on the cluster
/// (accepted limitation, see spec.md §9).
pub struct ChaosLoop<C: Clock> {
    prototypes: Vec<Box<dyn FailureType>>,
    health: Arc<dyn HealthOracle>,
    clock: C,
    config: ChaosLoopConfig,
    draw: Arc<dyn Fn() -> f64 + Send + Sync>,
    steady_state: Arc<dyn Fn() -> bool + Send + Sync>,
}

impl<C: Clock> ChaosLoop<C> {
    pub fn new(
        prototypes: Vec<Box<dyn FailureType>>,
        health: Arc<dyn HealthOracle>,
        clock: C,
        config: ChaosLoopConfig,
    ) -> Self {
        Self {
            prototypes,
            health,
            clock,
            config,
            draw: Arc::new(|| rand::thread_rng().gen::<f64>()),
            steady_state: Arc::new(|| true),
        }
    }

    /// Override the uniform-draw source (tests only; production always uses
    /// `rand::thread_rng`).
    pub fn with_draw_fn(mut self, draw: Arc<dyn Fn() -> f64 + Send + Sync>) -> Self {
        self.draw = draw;
        self
    }

    /// Install the steady-state verification hook (spec.md §4.5: currently
    /// a trivial `true`; reserved for future SUT-specific checks).
    pub fn with_steady_state_check(mut self, check: Arc<dyn Fn() -> bool + Send + Sync>) -> Self {
        self.steady_state = check;
        self
    }

    /// Run one iteration of the loop against `stack`, mutating it in place.
    pub async fn run_iteration(&self, stack: &mut Vec<Box<dyn Failure>>) -> Result<(), FaultError> {
        let pushed_this_iteration = match get_failure(&self.prototypes).await {
            Ok(failure) => {
                tracing::info!(failure = %failure, "pushed fault");
                stack.push(failure);
                true
            }
            Err(e) => {
                tracing::debug!(%e, "no safe fault this iteration");
                false
            }
        };

        if pushed_this_iteration && (self.draw)() < self.config.additional_failure_probability {
            tracing::info!("compounding: skipping mitigation wait this iteration");
            return Ok(());
        }

        if let Some(top) = stack.last() {
            let mitigated = self.await_mitigation(top.as_ref(), self.config.mitigation_timeout).await?;
            if !mitigated {
                return Err(FaultError::MitigationTimeout {
                    failure: top.to_string(),
                    timeout_secs: self.config.mitigation_timeout,
                });
            }

            while let Some(fault) = stack.pop() {
                fault.repair().await?;
            }

            let healthy = self.health.healthy(self.config.mitigation_timeout).await?;
            if !healthy {
                return Err(FaultError::MitigationTimeout {
                    failure: "cluster health".to_string(),
                    timeout_secs: self.config.mitigation_timeout,
                });
            }
        }

        self.await_next_failure().await;
        Ok(())
    }

    /// Poll `fault.mitigated()` every 10s until true or `timeout_secs`
    /// passes, running the steady-state hook on every sleep iteration.
    async fn await_mitigation(&self, fault: &dyn Failure, timeout_secs: f64) -> Result<bool, ClusterError> {
        let deadline = self.clock.now() + timeout_secs;
        loop {
            if fault.mitigated(0.0).await? {
                return Ok(true);
            }
            if self.clock.now() >= deadline {
                return Ok(false);
            }
            self.clock.sleep_until((self.clock.now() + 10.0).min(deadline)).await;
            (self.steady_state)();
        }
    }

    /// Memoryless delay: draw `u ~ U(0,1)` every simulated second, terminate
    /// when `u < 1/mttf`. Runs the steady-state hook every `check_interval`.
    async fn await_next_failure(&self) {
        let mut since_check = 0.0_f64;
        loop {
            let u = (self.draw)();
            if u < 1.0 / self.config.mttf {
                return;
            }
            self.clock.sleep_until(self.clock.now() + 1.0).await;
            since_check += 1.0;
            if since_check >= self.config.check_interval {
                (self.steady_state)();
                since_check = 0.0;
            }
        }
    }
}
