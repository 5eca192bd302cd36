//! Tracing initialization and subscriber setup.
//!
//! This module wires the `tracing` macros used throughout the crate to a
//! compact formatter. The host application may install its own subscriber
//! instead; in that case calling [`init_tracing`] is a no-op.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::Config;

/// Initializes the tracing subscriber with a compact stderr formatter.
///
/// # Trace Level Resolution
///
/// Level is determined by:
/// 1. `RUST_LOG` environment variable (highest priority)
/// 2. `config.trace_level` if set
/// 3. Default: `"info"`
///
/// # Initialization Behavior
///
/// Idempotent: safe to call multiple times, and a no-op when the host
/// already installed a global subscriber (only the first registration takes
/// effect).
///
/// # Example
///
/// ```rust
/// use shelfsync::observability::init_tracing;
/// use shelfsync::Config;
///
/// let config = Config {
///     trace_level: Some("debug".to_string()),
///     ..Default::default()
/// };
///
/// init_tracing(&config);
///
/// tracing::debug!("tracing is now active");
/// ```
pub fn init_tracing(config: &Config) {
    let level = config
        .trace_level
        .clone()
        .unwrap_or_else(|| "info".to_string());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr));

    let _ = subscriber.try_init();
}
