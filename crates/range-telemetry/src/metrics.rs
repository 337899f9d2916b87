//! Prometheus metrics for the range scoreboard.
//!
//! All metrics follow the naming convention: `rs_<subsystem>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, IntGauge, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // INGESTION METRICS
    // =========================================================================

    /// Telegrams accepted and persisted
    pub static ref TELEGRAMS_ACCEPTED: Counter = Counter::new(
        "rs_ingest_telegrams_accepted_total",
        "Total score telegrams accepted"
    ).expect("metric creation failed");

    /// Telegrams rejected, by reason
    pub static ref TELEGRAMS_REJECTED: CounterVec = CounterVec::new(
        Opts::new("rs_ingest_telegrams_rejected_total", "Score telegrams rejected by reason"),
        &["reason"]
    ).expect("metric creation failed");

    /// Ledgers whose items did not add up to the claimed score
    pub static ref TAMPER_DETECTED: Counter = Counter::new(
        "rs_ingest_tamper_detected_total",
        "Vulnerability ledgers failing the point-sum check"
    ).expect("metric creation failed");

    /// First-completion announcements emitted
    pub static ref COMPLETIONS_ANNOUNCED: Counter = Counter::new(
        "rs_ingest_completions_announced_total",
        "First perfect-score announcements"
    ).expect("metric creation failed");

    /// Completion side effects that failed after the completion was recorded
    pub static ref COMPLETION_SIDE_EFFECT_FAILURES: CounterVec = CounterVec::new(
        Opts::new(
            "rs_ingest_completion_side_effect_failures_total",
            "Announcement writes and notifications that failed after a first completion"
        ),
        &["kind"]
    ).expect("metric creation failed");

    /// End-to-end telegram processing time
    pub static ref INGEST_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "rs_ingest_duration_seconds",
            "Time spent decoding, validating and persisting a telegram"
        ).buckets(exponential_buckets(0.0001, 2.0, 14).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // SHELL RELAY METRICS
    // =========================================================================

    /// Sessions currently in the Active state
    pub static ref SHELL_SESSIONS_ACTIVE: IntGauge = IntGauge::new(
        "rs_shell_sessions_active",
        "Shell sessions with an attached operator"
    ).expect("metric creation failed");

    /// Pipe rebuilds after a target read failure
    pub static ref SHELL_RECONNECTS: Counter = Counter::new(
        "rs_shell_reconnects_total",
        "Shell pipe rebuilds after a target read error"
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; already-registered collectors are skipped.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Ingestion
        Box::new(TELEGRAMS_ACCEPTED.clone()),
        Box::new(TELEGRAMS_REJECTED.clone()),
        Box::new(TAMPER_DETECTED.clone()),
        Box::new(COMPLETIONS_ANNOUNCED.clone()),
        Box::new(COMPLETION_SIDE_EFFECT_FAILURES.clone()),
        Box::new(INGEST_DURATION.clone()),
        // Shell relay
        Box::new(SHELL_SESSIONS_ACTIVE.clone()),
        Box::new(SHELL_RECONNECTS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}
