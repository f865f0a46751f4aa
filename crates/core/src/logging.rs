//! Structured logging infrastructure for Motorist.
//!
//! Centralized logging initialization with environment-based filtering.
//! Log statements throughout the workspace carry identifiers only
//! (car ids, certificate subjects, table names); key material is never
//! logged at any level.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging with human-readable output.
///
/// The log level is taken from the `RUST_LOG` environment variable and
/// defaults to `info` when unset.
///
/// # Example
/// ```no_run
/// use motorist_core::logging;
///
/// logging::init();
/// tracing::info!("Device starting");
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

/// Initialize logging with JSON output for log-aggregation environments.
///
/// Same `RUST_LOG` handling as [`init`].
pub fn init_json() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_target(true))
        .init();
}
