//! Log configuration.

use std::env;
use std::str::FromStr;

/// How log records are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Coloured single-line records for a terminal.
    Pretty,
    /// One JSON object per record, for log shippers.
    Json,
    /// Install the filter but print nothing.
    Off,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "off" | "none" => Ok(Self::Off),
            other => Err(format!("unknown log format {other:?}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Attached to the startup and shutdown records.
    pub service_name: String,
    /// `EnvFilter` directive, e.g. `info` or `rs_04_shell_relay=debug,info`.
    pub log_level: String,
    pub format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "range-scoreboard".to_string(),
            log_level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl TelemetryConfig {
    /// Read `RS_SERVICE_NAME`, `RS_LOG_LEVEL` (or `RUST_LOG`) and
    /// `RS_LOG_FORMAT` from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
    ///
    /// Without `RS_LOG_FORMAT`, output is JSON when running under Kubernetes
    /// or Docker and pretty otherwise. An unrecognised format falls back to
    /// that default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let in_container = lookup("KUBERNETES_SERVICE_HOST").is_some()
            || lookup("DOCKER_CONTAINER").is_some();
        let fallback_format = if in_container {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        };

        Self {
            service_name: lookup("RS_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: lookup("RS_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            format: lookup("RS_LOG_FORMAT")
                .and_then(|f| f.parse().ok())
                .unwrap_or(fallback_format),
        }
    }

    /// Override the log level (used by the `--log-level` CLI flag).
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let config = TelemetryConfig::from_lookup(lookup(&[]));
        assert_eq!(config.service_name, "range-scoreboard");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.format, LogFormat::Pretty);
    }

    #[test]
    fn test_containers_default_to_json() {
        let config = TelemetryConfig::from_lookup(lookup(&[("DOCKER_CONTAINER", "1")]));
        assert_eq!(config.format, LogFormat::Json);

        let config = TelemetryConfig::from_lookup(lookup(&[
            ("DOCKER_CONTAINER", "1"),
            ("RS_LOG_FORMAT", "off"),
        ]));
        assert_eq!(config.format, LogFormat::Off);
    }

    #[test]
    fn test_log_level_precedence() {
        let config = TelemetryConfig::from_lookup(lookup(&[
            ("RUST_LOG", "warn"),
            ("RS_LOG_LEVEL", "debug"),
        ]));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.with_log_level("trace").log_level, "trace");
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse(), Ok(LogFormat::Json));
        assert_eq!(" text ".parse(), Ok(LogFormat::Pretty));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
