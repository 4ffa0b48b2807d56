//! Annotation and label keys for workload lifecycle persistence.
//!
//! These are the durable store for a workload instance's lifecycle state
//! (spec.md §3, "Workload instance"). The lifecycle engine treats annotation
//! reads as authoritative and never caches lifecycle state across ticks
//! (SPEC_FULL.md §9).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Label applied to every workload deployment this controller manages, so
/// resumption can find them again after a restart.
pub const CONTROLLER_LABEL_KEY: &str = "controller";
pub const CONTROLLER_LABEL_VALUE: &str = "osio";

pub const ANNOTATION_ACTIVE: &str = "osio-active";
pub const ANNOTATION_IDLE: &str = "osio-idle";
pub const ANNOTATION_DESTROY_AT: &str = "osio-destroy-at";
pub const ANNOTATION_IDLE_AT: &str = "osio-idle-at";
pub const ANNOTATION_HEALTH_AT: &str = "osio-health-at";
pub const ANNOTATION_NEXT_TIME: &str = "osio-next-time";
pub const ANNOTATION_NEXT_ACTION: &str = "osio-next-action";
pub const ANNOTATION_PVC: &str = "osio-pvc";

/// Initial-run health check interval (seconds), used immediately after a
/// deployment is created or flips active, per spec.md §4.7.
pub const INITIAL_HEALTH_INTERVAL_SECS: f64 = 90.0;

/// Steady-state (running) health check interval (seconds), used once the
/// workload has passed its first health check, per spec.md §4.7.
pub const RUNNING_HEALTH_INTERVAL_SECS: f64 = 10.0;

/// The closed sum type for `osio-next-action`. A fourth value found on a
/// deployment's annotations is a hard failure (SPEC_FULL.md §9:
/// "a fourth value must fail the process").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NextAction {
    Destroy,
    Idle,
    Health,
}

impl fmt::Display for NextAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl NextAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            NextAction::Destroy => "destroy",
            NextAction::Idle => "idle",
            NextAction::Health => "health",
        }
    }
}

/// Error returned when an `osio-next-action` annotation holds a value
/// outside the closed set `{destroy, idle, health}`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown osio-next-action value: {0:?}")]
pub struct UnknownNextAction(pub String);

impl FromStr for NextAction {
    type Err = UnknownNextAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "destroy" => Ok(NextAction::Destroy),
            "idle" => Ok(NextAction::Idle),
            "health" => Ok(NextAction::Health),
            other => Err(UnknownNextAction(other.to_string())),
        }
    }
}

/// Given the three candidate deadlines, return the minimum along with the
/// `NextAction` it corresponds to. Ties favor `Destroy` then `Idle` then
/// `Health`, an arbitrary but stable tie-break.
pub fn next_action_for(destroy_at: f64, idle_at: f64, health_at: f64) -> (f64, NextAction) {
    let mut best = (destroy_at, NextAction::Destroy);
    if idle_at < best.0 {
        best = (idle_at, NextAction::Idle);
    }
    if health_at < best.0 {
        best = (health_at, NextAction::Health);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_three_closed_variants() {
        assert_eq!("destroy".parse::<NextAction>().unwrap(), NextAction::Destroy);
        assert_eq!("idle".parse::<NextAction>().unwrap(), NextAction::Idle);
        assert_eq!("health".parse::<NextAction>().unwrap(), NextAction::Health);
    }

    #[test]
    fn rejects_a_fourth_value() {
        assert!("reboot".parse::<NextAction>().is_err());
    }

    #[test]
    fn next_action_picks_the_minimum() {
        assert_eq!(next_action_for(100.0, 50.0, 200.0), (50.0, NextAction::Idle));
        assert_eq!(next_action_for(10.0, 50.0, 200.0), (10.0, NextAction::Destroy));
        assert_eq!(next_action_for(100.0, 150.0, 20.0), (20.0, NextAction::Health));
    }
}
