//! Tracing setup for tests.

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber writing to the test harness.
///
/// The filter comes from `RUST_LOG`, falling back to `debug`.
/// Calling it more than once is harmless.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_thread_names(true)
        .try_init();
    if installed.is_ok() {
        tracing::debug!("test tracing installed");
    }
}
