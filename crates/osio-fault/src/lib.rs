// SPDX-License-Identifier: MIT

//! Fault prototype registry, selector, and the fault-injection loop
//! (spec.md §4.4, §4.5).

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod delete_pod;
mod error;
mod failure;
#[path = "loop_.rs"]
mod loop_mod;
mod selector;

pub use delete_pod::{DeletePod, DeletePodType};
pub use error::{FaultError, NoSafeFailures};
pub use failure::{Failure, FailureType};
pub use loop_mod::{ChaosLoop, ChaosLoopConfig};
pub use selector::get_failure;
