//! Telemetry Module
//!
//! Tracing subscriber setup for hosts embedding the cache.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "local_ttl_cache=info";

/// Installs a global `fmt` subscriber filtered by `RUST_LOG`.
///
/// Returns false if a global subscriber was already installed, which makes
/// repeated calls from tests harmless.
pub fn init_tracing() -> bool {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
