/// Profile handlers
use crate::error::Result;
use crate::handlers::form::read_multipart;
use crate::handlers::{ok, page, ListQuery};
use crate::services::{AccountService, FeedPaginator, Identity};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

/// GET /api/v1/users/me
pub async fn get_me(accounts: web::Data<AccountService>, identity: Identity) -> HttpResponse {
    ok(accounts.me(&identity))
}

/// PUT /api/v1/users/me (multipart: name?, bio?, avatar?)
pub async fn update_me(
    accounts: web::Data<AccountService>,
    identity: Identity,
    payload: Multipart,
) -> Result<HttpResponse> {
    let mut form = read_multipart(payload, "avatar", accounts.avatar_constraints()).await?;
    let profile = accounts
        .update_profile(&identity, form.take("name"), form.take("bio"), form.file.take())
        .await?;
    Ok(ok(profile))
}

/// GET /api/v1/users/{user_id}
pub async fn get_user(
    accounts: web::Data<AccountService>,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    Ok(ok(accounts.profile(user_id.into_inner()).await?))
}

/// GET /api/v1/users/{user_id}/posts
pub async fn get_user_posts(
    accounts: web::Data<AccountService>,
    feed: web::Data<FeedPaginator>,
    user_id: web::Path<Uuid>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    let user_id = user_id.into_inner();
    // 404 for unknown users rather than an empty page
    accounts.profile(user_id).await?;
    let posts = feed.list_by_owner(user_id, query.page, query.limit).await?;
    Ok(page(posts))
}
