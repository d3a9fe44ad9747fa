//! Logging bootstrap shared by the service binaries

use tracing::info;
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Calling this more
/// than once keeps the first subscriber.
pub fn init(service: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
    {
        info!(service, "Logging initialized");
    }
}
