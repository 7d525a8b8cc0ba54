//! Tracing subscriber setup for binaries embedding the client.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Env var holding the tracing filter directive.
pub const LOG_ENV: &str = "CHECKIN_LOG";
const DEFAULT_FILTER: &str = "warn";

/// Installs a stderr subscriber filtered by `CHECKIN_LOG` (default `warn`).
///
/// Safe to call more than once; only the first call installs anything.
pub fn init() {
    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let log_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .boxed();

    if tracing_subscriber::registry()
        .with(env_filter)
        .with(log_layer)
        .try_init()
        .is_ok()
    {
        tracing::debug!(version = env!("CARGO_PKG_VERSION"), "logging initialized");
    }
}
