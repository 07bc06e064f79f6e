//! Prometheus metrics for relay-service

use crate::relay::{DisconnectReason, EventKind};
use actix_web::HttpResponse;
use prometheus::{
    register_int_counter_vec, register_int_gauge, Encoder, IntCounterVec, IntGauge, TextEncoder,
};

lazy_static::lazy_static! {
    static ref ACTIVE_CONNECTIONS: IntGauge = register_int_gauge!(
        "relay_active_connections",
        "Connections currently registered with the hub"
    ).expect("Prometheus metrics registration should succeed at startup");

    static ref EVENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "relay_events_total",
        "Events accepted and fanned out, by kind",
        &["kind"]
    ).expect("Prometheus metrics registration should succeed at startup");

    static ref DISCONNECTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "relay_disconnects_total",
        "Closed connections by reason (clean / error)",
        &["reason"]
    ).expect("Prometheus metrics registration should succeed at startup");

    static ref FRAMES_DROPPED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "relay_frames_dropped_total",
        "Inbound frames dropped without forwarding, by reason",
        &["reason"]
    ).expect("Prometheus metrics registration should succeed at startup");
}

pub(crate) fn set_active_connections(count: usize) {
    ACTIVE_CONNECTIONS.set(count as i64);
}

pub(crate) fn record_event(kind: EventKind) {
    EVENTS_TOTAL.with_label_values(&[kind.as_str()]).inc();
}

pub(crate) fn record_disconnect(reason: DisconnectReason) {
    DISCONNECTS_TOTAL.with_label_values(&[reason.as_str()]).inc();
}

/// Error disconnects so far, for health reporting
pub fn error_disconnects() -> u64 {
    DISCONNECTS_TOTAL
        .with_label_values(&[DisconnectReason::Error.as_str()])
        .get()
}

pub(crate) fn record_dropped_frame(reason: &str) {
    FRAMES_DROPPED_TOTAL.with_label_values(&[reason]).inc();
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
