//! Logging setup for the benchmark binary.

use tracing_subscriber::EnvFilter;

/// Installs a `RUST_LOG`-driven subscriber writing to stderr, defaulting to
/// `warn` so benchmark output on stdout stays clean. No-op if a global
/// subscriber is already set.
pub fn init_tracing() {
  if tracing::dispatcher::has_been_set() {
    return;
  }
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .try_init();
}
