/// Post handlers - HTTP endpoints for post operations
use crate::error::Result;
use crate::handlers::form::{read_multipart, MultipartForm};
use crate::handlers::{created, ok, page, ListQuery};
use crate::services::{ContentService, FeedPaginator, Identity, PostDraft};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

/// Multipart part carrying the post image
const IMAGE_FIELD: &str = "image";

fn draft(form: &mut MultipartForm) -> PostDraft {
    PostDraft {
        title: form.take("title"),
        description: form.take("description"),
        hashtags: form.take("hashtags"),
    }
}

/// POST /api/v1/posts (multipart: title, description?, hashtags?, image)
pub async fn create_post(
    content: web::Data<ContentService>,
    identity: Identity,
    payload: Multipart,
) -> Result<HttpResponse> {
    let mut form = read_multipart(payload, IMAGE_FIELD, content.constraints()).await?;
    let post = content
        .publish(identity.user_id, draft(&mut form), form.file.take())
        .await?;
    Ok(created(post))
}

/// GET /api/v1/posts
pub async fn list_posts(
    feed: web::Data<FeedPaginator>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    Ok(page(feed.list(query.page, query.limit).await?))
}

/// GET /api/v1/posts/{post_id}
pub async fn get_post(
    content: web::Data<ContentService>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    Ok(ok(content.get(post_id.into_inner()).await?))
}

/// PUT|PATCH /api/v1/posts/{post_id} (multipart, every part optional)
pub async fn update_post(
    content: web::Data<ContentService>,
    identity: Identity,
    post_id: web::Path<Uuid>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let mut form = read_multipart(payload, IMAGE_FIELD, content.constraints()).await?;
    let post = content
        .update(
            post_id.into_inner(),
            identity.user_id,
            draft(&mut form),
            form.file.take(),
        )
        .await?;
    Ok(ok(post))
}

/// DELETE /api/v1/posts/{post_id}
pub async fn delete_post(
    content: web::Data<ContentService>,
    identity: Identity,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    content.delete(post_id.into_inner(), identity.user_id).await?;
    Ok(ok(serde_json::json!({})))
}

/// POST /api/v1/posts/{post_id}/views
pub async fn record_view(
    content: web::Data<ContentService>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let views = content.record_view(post_id.into_inner()).await?;
    Ok(ok(serde_json::json!({ "views": views })))
}
