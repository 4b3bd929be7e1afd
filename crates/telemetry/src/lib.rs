//! Logging for the Tatari pre-commit hooks
//!
//! Hook output proper goes through the report printer; this crate only wires
//! `tracing` diagnostics to stderr so they never mix with tool output on
//! stdout.

use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding a full `EnvFilter` directive
pub const LOG_ENV: &str = "TATARI_HOOKS_LOG";

/// Initialize logging for a `-v` count
pub fn init(verbosity: u8) -> anyhow::Result<()> {
    init_with_config(TelemetryConfig::for_verbosity(verbosity))
}

/// Initialize with custom configuration
pub fn init_with_config(config: TelemetryConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.show_target)
            .without_time()
            .compact());

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "logging initialized");
    Ok(())
}

/// Default filter for a `-v` count
pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub show_target: bool,
}

impl TelemetryConfig {
    pub fn for_verbosity(verbosity: u8) -> Self {
        Self {
            log_level: level_for_verbosity(verbosity).to_string(),
            // Module paths help once someone is debugging
            show_target: verbosity >= 2,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::for_verbosity(0)
    }
}

/// Timer for measuring how long a hook takes
pub struct Timer {
    name: String,
    start: Instant,
}

impl Timer {
    /// Start a new timer
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
        }
    }

    /// Stop the timer and log the duration
    pub fn stop(self) -> Duration {
        let duration = self.start.elapsed();
        tracing::debug!(
            hook = %self.name,
            duration_ms = duration.as_millis(),
            "hook completed"
        );
        duration
    }
}
