/// Like and comment handlers
use crate::error::Result;
use crate::handlers::{created, ok};
use crate::services::{EngagementService, Identity};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentRequest {
    pub text: String,
}

/// POST /api/v1/posts/{post_id}/like
pub async fn toggle_like(
    engagement: web::Data<EngagementService>,
    identity: Identity,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let likes = engagement
        .toggle_like(post_id.into_inner(), identity.user_id)
        .await?;
    Ok(ok(likes))
}

/// POST /api/v1/posts/{post_id}/comment
pub async fn add_comment(
    engagement: web::Data<EngagementService>,
    identity: Identity,
    post_id: web::Path<Uuid>,
    req: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    let comments = engagement
        .add_comment(post_id.into_inner(), identity.user_id, &req.text)
        .await?;
    Ok(created(comments))
}

/// DELETE /api/v1/posts/{post_id}/comment/{comment_id}
pub async fn delete_comment(
    engagement: web::Data<EngagementService>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comments = engagement
        .delete_comment(post_id, comment_id, identity.user_id)
        .await?;
    Ok(ok(comments))
}
