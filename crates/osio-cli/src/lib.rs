// SPDX-License-Identifier: MIT

//! Shared plumbing for the `osio-workload` and `osio-chaos` binaries:
//! `clap` flag structs, `tracing-subscriber` setup, and the diagnostics
//! shell-out used on a fatal error (spec.md §6, §7, SPEC_FULL.md §11).

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod args;
mod diagnostics;
mod logging;

pub use args::{ChaosArgs, WorkloadArgs};
pub use diagnostics::gather_diagnostics;
pub use logging::init_tracing;
