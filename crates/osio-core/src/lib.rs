// SPDX-License-Identifier: MIT

//! Shared scalars for the osio chaos & workload co-driver: a testable
//! [`Clock`], the workload lifecycle annotation schema, shared random draws,
//! and small id helpers. No crate in this workspace talks to Kubernetes
//! directly from here — that lives in `osio-gateway`.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod annotations;
mod clock;
mod config;
mod id;
mod rng;

pub use annotations::{
    next_action_for, NextAction, UnknownNextAction, ANNOTATION_ACTIVE, ANNOTATION_DESTROY_AT,
    ANNOTATION_HEALTH_AT, ANNOTATION_IDLE, ANNOTATION_IDLE_AT, ANNOTATION_NEXT_ACTION,
    ANNOTATION_NEXT_TIME, ANNOTATION_PVC, CONTROLLER_LABEL_KEY, CONTROLLER_LABEL_VALUE,
    INITIAL_HEALTH_INTERVAL_SECS, RUNNING_HEALTH_INTERVAL_SECS,
};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{AccessMode, UnknownAccessMode, WorkloadConfig};
pub use id::new_uid;
pub use rng::{exponential_draw, rate_to_probability};
