//! Prometheus metrics for thought-service
//!
//! Exposes store-call collectors and the handler behind `/metrics`.

use actix_web::HttpResponse;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static::lazy_static! {
    /// Store calls by operation and outcome (ok / unavailable / rejected)
    pub static ref STORE_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "thought_store_operations_total",
        "Store operations by outcome, counted once per retried unit",
        &["operation", "outcome"]
    ).expect("Prometheus metrics registration should succeed at startup");

    /// Wall time of a store call including retries and backoff
    pub static ref STORE_OPERATION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "thought_store_operation_duration_seconds",
        "Store operation latency including retries",
        &["operation"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).expect("Prometheus metrics registration should succeed at startup");
}

pub fn record_store_operation(operation: &str, outcome: &str, elapsed_secs: f64) {
    STORE_OPERATIONS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
    STORE_OPERATION_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(elapsed_secs);
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
