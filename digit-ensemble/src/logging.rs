//! Tracing setup for the binary
//!
//! The subscriber is installed before configuration is resolved, so the
//! config loader's own messages are kept. `RUST_LOG` wins; otherwise the
//! filter starts at `info` and is swapped for `[logging] level` once the
//! configuration is known.

use digit_common::LoggingConfig;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

/// Filter used until the configuration is loaded
const STARTUP_FILTER: &str = "info";

/// Handle for adjusting the installed log filter
pub struct LogControl {
    handle: reload::Handle<EnvFilter, Registry>,
    env_override: bool,
}

impl LogControl {
    /// Whether `RUST_LOG` fixed the filter
    pub fn env_override(&self) -> bool {
        self.env_override
    }

    /// Apply the configured level unless `RUST_LOG` is set
    pub fn apply_config(&self, config: &LoggingConfig) {
        if self.env_override {
            return;
        }
        if let Err(e) = self.handle.reload(EnvFilter::new(&config.level)) {
            warn!("Failed to apply log level '{}': {}", config.level, e);
        }
    }
}

/// Reloadable filter layer starting from `env_filter`, or `info` if absent
pub fn filter_layer(
    env_filter: Option<EnvFilter>,
) -> (reload::Layer<EnvFilter, Registry>, LogControl) {
    let env_override = env_filter.is_some();
    let filter = env_filter.unwrap_or_else(|| EnvFilter::new(STARTUP_FILTER));
    let (layer, handle) = reload::Layer::new(filter);
    (
        layer,
        LogControl {
            handle,
            env_override,
        },
    )
}

/// Install the global subscriber
pub fn init() -> LogControl {
    let (filter, control) = filter_layer(EnvFilter::try_from_default_env().ok());
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
    control
}
