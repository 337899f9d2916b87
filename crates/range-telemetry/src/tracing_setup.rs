//! Global `tracing` subscriber.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::config::{LogFormat, TelemetryConfig};
use crate::TelemetryError;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Parse the level directive, falling back to `RUST_LOG`.
fn filter(directive: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directive)
        .or_else(|_| EnvFilter::try_from_default_env())
        .map_err(|e| TelemetryError::SubscriberInit(format!("{directive:?}: {e}")))
}

/// Output layer for `format`, with the level filter attached.
fn output_layer(format: LogFormat, filter: EnvFilter) -> BoxedLayer {
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(filter)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .compact()
            .with_target(true)
            .with_filter(filter)
            .boxed(),
        LogFormat::Off => fmt::layer()
            .with_writer(std::io::sink)
            .with_filter(filter)
            .boxed(),
    }
}

/// Install the subscriber. Fails if one is already installed.
pub(crate) fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let layer = output_layer(config.format, filter(&config.log_level)?);
    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        format = ?config.format,
        "log subscriber installed"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_crate_directive_accepted() {
        assert!(filter("rs_04_shell_relay=debug,info").is_ok());
    }

    #[test]
    fn test_every_format_builds_a_layer() {
        for format in [LogFormat::Pretty, LogFormat::Json, LogFormat::Off] {
            let _layer = output_layer(format, EnvFilter::new("info"));
        }
    }
}
