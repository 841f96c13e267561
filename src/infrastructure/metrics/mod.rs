//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - HTTP request counts by method, path, and status
//! - HTTP request latency histograms
//! - Session admission outcomes (started, time limit, max viewers)
//! - Heartbeat counts and active viewer gauges
//! - Active WebSocket connection gauges

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request counter - tracks total requests by method, path, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests")
            .namespace("stream_gate"),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// HTTP request latency histogram - tracks request duration in seconds
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        )
        .namespace("stream_gate")
        .buckets(buckets),
        &["method", "path"],
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric")
});

/// Session admission outcome counter
pub static SESSION_ADMISSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "session_admissions_total",
            "Session start attempts by outcome",
        )
        .namespace("stream_gate"),
        &["outcome"], // "started", "time_limit", "max_viewers", "denied", "error"
    )
    .expect("Failed to create SESSION_ADMISSIONS_TOTAL metric")
});

/// Heartbeat counter
pub static SESSION_HEARTBEATS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("session_heartbeats_total", "Heartbeats processed by outcome")
            .namespace("stream_gate"),
        &["outcome"], // "ok", "exhausted", "error"
    )
    .expect("Failed to create SESSION_HEARTBEATS_TOTAL metric")
});

/// Active viewers gauge, per event
pub static ACTIVE_VIEWERS: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        Opts::new("active_viewers", "Devices currently counted as watching")
            .namespace("stream_gate"),
        &["event_id"],
    )
    .expect("Failed to create ACTIVE_VIEWERS metric")
});

/// Active WebSocket connections gauge
pub static WEBSOCKET_CONNECTIONS_ACTIVE: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        Opts::new(
            "websocket_connections_active",
            "Number of active WebSocket connections",
        )
        .namespace("stream_gate"),
        &["state"], // "connected", "joined"
    )
    .expect("Failed to create WEBSOCKET_CONNECTIONS_ACTIVE metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("Failed to register HTTP_REQUESTS_TOTAL");
    registry
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");
    registry
        .register(Box::new(SESSION_ADMISSIONS_TOTAL.clone()))
        .expect("Failed to register SESSION_ADMISSIONS_TOTAL");
    registry
        .register(Box::new(SESSION_HEARTBEATS_TOTAL.clone()))
        .expect("Failed to register SESSION_HEARTBEATS_TOTAL");
    registry
        .register(Box::new(ACTIVE_VIEWERS.clone()))
        .expect("Failed to register ACTIVE_VIEWERS");
    registry
        .register(Box::new(WEBSOCKET_CONNECTIONS_ACTIVE.clone()))
        .expect("Failed to register WEBSOCKET_CONNECTIONS_ACTIVE");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Metrics should be valid UTF-8")
}

/// Helper to record HTTP request metrics
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

/// Helper to record a session admission outcome
pub fn record_admission(outcome: &str) {
    SESSION_ADMISSIONS_TOTAL
        .with_label_values(&[outcome])
        .inc();
}

/// Helper to record a heartbeat outcome
pub fn record_heartbeat(outcome: &str) {
    SESSION_HEARTBEATS_TOTAL
        .with_label_values(&[outcome])
        .inc();
}

/// Helper to update the per-event viewer gauge
pub fn set_active_viewers(event_id: i64, count: i64) {
    ACTIVE_VIEWERS
        .with_label_values(&[&event_id.to_string()])
        .set(count as f64);
}

/// Helper to update WebSocket connection counts
pub fn set_websocket_connections(connected: i64, joined: i64) {
    WEBSOCKET_CONNECTIONS_ACTIVE
        .with_label_values(&["connected"])
        .set(connected as f64);
    WEBSOCKET_CONNECTIONS_ACTIVE
        .with_label_values(&["joined"])
        .set(joined as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        // Force lazy initialization
        let _ = &*REGISTRY;
        let _ = &*HTTP_REQUESTS_TOTAL;
        let _ = &*SESSION_ADMISSIONS_TOTAL;
        let _ = &*ACTIVE_VIEWERS;
    }

    #[test]
    fn test_gather_metrics() {
        let metrics = gather_metrics();
        assert!(!metrics.is_empty());
    }

    #[test]
    fn test_record_admission() {
        record_admission("started");
        let metrics = gather_metrics();
        assert!(metrics.contains("session_admissions_total"));
    }
}
