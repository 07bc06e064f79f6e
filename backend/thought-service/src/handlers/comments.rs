/// Comment handlers
use crate::error::Result;
use crate::models::CreateCommentRequest;
use crate::services::ThoughtService;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

pub async fn create_comment(
    service: web::Data<ThoughtService>,
    post_id: web::Path<Uuid>,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    let comment = service
        .create_comment(post_id.into_inner(), req.content.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(comment))
}

/// A comment can only be deleted through the post it belongs to
pub async fn delete_comment(
    service: web::Data<ThoughtService>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let deleted = service.delete_comment(post_id, comment_id).await?;
    Ok(HttpResponse::Ok().json(deleted))
}
