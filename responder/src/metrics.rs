//! Prometheus metrics for the responder

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram, Counter,
    CounterVec, Encoder, Gauge, Histogram, TextEncoder,
};

// ── Connection metrics ───────────────────────────────────────────────────────

pub static CONNECTIONS_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!("sampreset_connections_total", "Total connections accepted").unwrap()
});

pub static ACTIVE_CONNECTIONS: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "sampreset_active_connections",
        "Connections currently being served"
    )
    .unwrap()
});

pub static CONNECTION_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "sampreset_connection_duration_seconds",
        "Time from accept to close",
        vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    )
    .unwrap()
});

// ── Response metrics ─────────────────────────────────────────────────────────

pub static RESPONSES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sampreset_responses_total",
        "Responses written, by outcome",
        &["status"]
    )
    .unwrap()
});

pub static ACCEPT_ERRORS: Lazy<Counter> = Lazy::new(|| {
    register_counter!("sampreset_accept_errors_total", "Failed accept calls").unwrap()
});

/// Outcome label for `RESPONSES_TOTAL`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    Ok,
    WriteError,
    WriteTimeout,
}

impl ResponseOutcome {
    pub fn as_label(self) -> &'static str {
        match self {
            ResponseOutcome::Ok => "ok",
            ResponseOutcome::WriteError => "write_error",
            ResponseOutcome::WriteTimeout => "write_timeout",
        }
    }
}

pub fn record_response(outcome: ResponseOutcome) {
    RESPONSES_TOTAL.with_label_values(&[outcome.as_label()]).inc();
}

/// Render all registered metrics to Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buffer) {
        tracing::warn!("metrics encoding failed: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}
