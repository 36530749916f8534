/// Registration and login handlers
use crate::error::Result;
use crate::handlers::form::read_multipart;
use crate::services::{AccountService, Registration, Session};
use actix_multipart::Multipart;
use actix_web::guard::GuardContext;
use actix_web::http::header;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn session_response(mut builder: actix_web::HttpResponseBuilder, session: Session) -> HttpResponse {
    builder.json(serde_json::json!({
        "success": true,
        "token": session.token,
        "data": session.user,
    }))
}

/// POST /api/v1/auth/register
pub async fn register(
    accounts: web::Data<AccountService>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let registration = Registration {
        name: req.name,
        email: req.email,
        password: req.password,
        bio: req.bio,
    };
    let session = accounts.register(registration, None).await?;
    Ok(session_response(HttpResponse::Created(), session))
}

/// Routes `multipart/form-data` registrations to `register_with_avatar`
pub fn is_multipart(ctx: &GuardContext<'_>) -> bool {
    ctx.head()
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

/// POST /api/v1/auth/register (multipart: name, email, password, bio?, avatar?)
pub async fn register_with_avatar(
    accounts: web::Data<AccountService>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let mut form = read_multipart(payload, "avatar", accounts.avatar_constraints()).await?;
    let registration = Registration {
        name: form.take("name").unwrap_or_default(),
        email: form.take("email").unwrap_or_default(),
        password: form.take("password").unwrap_or_default(),
        bio: form.take("bio"),
    };
    let session = accounts.register(registration, form.file.take()).await?;
    Ok(session_response(HttpResponse::Created(), session))
}

/// POST /api/v1/auth/login
pub async fn login(
    accounts: web::Data<AccountService>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let session = accounts.login(&req.email, &req.password).await?;
    Ok(session_response(HttpResponse::Ok(), session))
}
