/// Liveness and readiness endpoints
use crate::services::ThoughtService;
use actix_web::{web, HttpResponse};
use std::time::Instant;

/// Static facts reported by `/health`
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub api_base_url: String,
}

pub async fn health(info: web::Data<ServiceInfo>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "thought-service",
        "version": env!("CARGO_PKG_VERSION"),
        "apiBaseUrl": info.api_base_url,
    }))
}

/// Ready only when the store answers
pub async fn readiness(service: web::Data<ThoughtService>) -> HttpResponse {
    let start = Instant::now();
    let result = service.health().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "ready": true,
            "store": { "status": "healthy", "latency_ms": latency_ms },
        })),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "ready": false,
                "store": {
                    "status": "unhealthy",
                    "message": e.to_string(),
                    "latency_ms": latency_ms,
                },
            }))
        }
    }
}
