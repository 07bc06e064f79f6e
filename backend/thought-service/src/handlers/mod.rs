/// HTTP handlers for thought-service
///
/// - Posts: list, create, like
/// - Comments: create, delete
/// - Health: liveness and readiness
///
/// [`configure_routes`] is mounted both at the root and under `/api`.
pub mod comments;
pub mod health;
pub mod posts;

pub use comments::{create_comment, delete_comment};
pub use health::{health, readiness, ServiceInfo};
pub use posts::{create_post, like_post, list_posts};

use crate::config::CorsConfig;
use crate::error::AppError;
use actix_cors::Cors;
use actix_web::{http::header, web};

/// `*` anywhere in the list wins over the explicit origins
pub fn cors(config: &CorsConfig) -> Cors {
    let mut cors = Cors::default();
    if config.allows_any() {
        cors = cors.allow_any_origin();
    } else {
        for origin in config.origins() {
            cors = cors.allowed_origin(origin);
        }
    }
    cors.allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600)
}

/// Registers the post/comment/health routes plus extractor error handling
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .service(
            web::resource("/posts")
                .route(web::get().to(list_posts))
                .route(web::post().to(create_post)),
        )
        .route("/posts/{post_id}/comment", web::post().to(create_comment))
        .route(
            "/posts/{post_id}/comment/{comment_id}",
            web::delete().to(delete_comment),
        )
        .route("/posts/{post_id}/like", web::post().to(like_post))
        .route("/health", web::get().to(health))
        .route("/health/ready", web::get().to(readiness));
}

/// Unparsable bodies become a 400 with the usual error body
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        tracing::warn!(error = %err, "Rejected request body");
        AppError::Validation("Invalid JSON data".to_string()).into()
    })
}

/// Ids that are not UUIDs cannot name an existing record
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, req| {
        tracing::debug!(error = %err, path = %req.path(), "Unparsable path id");
        AppError::NotFound("Resource not found".to_string()).into()
    })
}
