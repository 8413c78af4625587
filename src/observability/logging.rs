//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for binaries and tools
//! - Honor `RUST_LOG` first, then the configured level

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `default_directive` is used when `RUST_LOG`
/// is unset or invalid (e.g. `"info"` or `"service_client=debug"`).
pub fn init_logging(default_directive: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}
