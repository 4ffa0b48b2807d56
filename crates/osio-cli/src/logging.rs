//! `tracing-subscriber` setup (SPEC_FULL.md §10), matching the teacher's
//! `env-filter`-based initialization in `crates/daemon`.

use tracing_subscriber::EnvFilter;

/// Initialize a global `tracing` subscriber reading `RUST_LOG`, defaulting
/// to `info` when unset. Safe to call once per binary; a second call is a
/// silent no-op (matches `tracing_subscriber::fmt`'s own `try_init`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
