//! Logging setup for the SimpleChat binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the given default log level.
///
/// Logging covers the client library crates and the binary itself; the
/// `RUST_LOG` environment variable overrides the default when set.
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "simplechat_client={level},simplechat_shared={level},{bin}={level}",
                    level = default_log_level,
                    bin = binary_name,
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
