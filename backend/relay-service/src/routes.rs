use actix_cors::Cors;
use actix_web::{http::header, web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;

use crate::metrics;
use crate::relay::{FanoutMode, HeartbeatConfig, RelayHub, WsSession};

/// Shared state for relay routes
#[derive(Clone)]
pub struct RelayState {
    pub hub: RelayHub,
    pub fanout: FanoutMode,
    pub heartbeat: HeartbeatConfig,
    /// Empty or containing `*` means any origin
    pub allowed_origins: Vec<String>,
}

impl RelayState {
    pub fn new(hub: RelayHub) -> Self {
        Self {
            hub,
            fanout: FanoutMode::default(),
            heartbeat: HeartbeatConfig::default(),
            allowed_origins: vec!["*".to_string()],
        }
    }

    /// Requests without an `Origin` header are not from browsers and pass
    pub fn origin_allowed(&self, origin: Option<&str>) -> bool {
        match origin {
            None => true,
            Some(_) if allows_any_origin(&self.allowed_origins) => true,
            Some(origin) => self
                .allowed_origins
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(origin)),
        }
    }
}

fn allows_any_origin(origins: &[String]) -> bool {
    origins.is_empty() || origins.iter().any(|o| o == "*")
}

/// CORS for the plain HTTP routes, following the same origin list as upgrades
pub fn cors(origins: &[String]) -> Cors {
    let mut cors = Cors::default();
    if allows_any_origin(origins) {
        cors = cors.allow_any_origin();
    } else {
        for origin in origins {
            cors = cors.allowed_origin(origin);
        }
    }
    cors.allowed_methods(vec!["GET", "POST"])
        .allow_any_header()
        .max_age(3600)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/ws", web::get().to(ws_handler))
        .route("/api/socket", web::get().to(ws_handler))
        .route("/health", web::get().to(health))
        .route("/metrics", web::get().to(metrics::serve_metrics));
}

/// WebSocket upgrade
pub async fn ws_handler(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<RelayState>,
) -> Result<HttpResponse, Error> {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok());

    if !state.origin_allowed(origin) {
        tracing::warn!(origin = origin.unwrap_or("-"), "Rejected WebSocket origin");
        return Ok(HttpResponse::Forbidden().json(serde_json::json!({
            "error": "Origin not allowed",
            "status": 403,
        })));
    }

    let (id, rx) = state.hub.register();
    let session = WsSession::new(id, rx, state.hub.clone(), state.fanout, state.heartbeat);

    ws::start(session, &req, stream).map_err(|e| {
        // Handshake failed, the session never started
        state.hub.unregister(id);
        tracing::warn!(connection_id = %id, error = %e, "WebSocket handshake failed");
        e
    })
}

pub async fn health(state: web::Data<RelayState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "relay-service",
        "version": env!("CARGO_PKG_VERSION"),
        "connections": state.hub.connection_count(),
        "errorDisconnects": metrics::error_disconnects(),
    }))
}
