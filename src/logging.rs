//! Logging Module
//!
//! Every component logs through the `tracing` facade. Nothing is recorded
//! until a subscriber is installed, so library users and tests get a no-op
//! logger by default.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a fmt subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter` (e.g. `"tiercache=info"`).
///
/// Returns `true` if this call installed the global subscriber, `false` if
/// one was already set.
pub fn init_tracing(default_filter: &str) -> bool {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
