/// Post handlers - HTTP endpoints for post operations
use crate::error::Result;
use crate::models::CreatePostRequest;
use crate::services::ThoughtService;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

/// List every post, newest first, with comments and like counts
pub async fn list_posts(service: web::Data<ThoughtService>) -> Result<HttpResponse> {
    let posts = service.list_posts().await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn create_post(
    service: web::Data<ThoughtService>,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let post = service
        .create_post(req.content.as_deref(), req.mood.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn like_post(
    service: web::Data<ThoughtService>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let likes = service.like_post(post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(likes))
}
