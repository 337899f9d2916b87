//! # Range Telemetry
//!
//! Structured logging and Prometheus metrics for the range scoreboard.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use range_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RS_SERVICE_NAME` | `range-scoreboard` | Service name in log records |
//! | `RS_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `RS_LOG_FORMAT` | `pretty` (`json` in containers) | `pretty`, `json` or `off` |

#![warn(clippy::all)]

mod config;
pub mod metrics;
mod tracing_setup;

pub use config::{LogFormat, TelemetryConfig};
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, COMPLETIONS_ANNOUNCED,
    COMPLETION_SIDE_EFFECT_FAILURES, INGEST_DURATION, SHELL_RECONNECTS, SHELL_SESSIONS_ACTIVE, TAMPER_DETECTED,
    TELEGRAMS_ACCEPTED, TELEGRAMS_REJECTED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize log subscriber: {0}")]
    SubscriberInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Install the log subscriber and register metrics.
///
/// Returns a guard that should be held for the lifetime of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Metrics first (synchronous, idempotent)
    register_metrics()?;

    tracing_setup::init_tracing(&config)?;

    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry...");
    }
}

/// Increment a counter, optionally by label values.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
