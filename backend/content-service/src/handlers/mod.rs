/// HTTP handlers for content-service
///
/// - `auth`: registration and login
/// - `users`: own profile, public profiles and a user's posts
/// - `posts`: post lifecycle and the paginated feed
/// - `engagement`: likes and comments
/// - `form`: streaming multipart reader shared by the upload routes
///
/// Every route lives under `/api/v1`. Responses use the `{success, data}`
/// envelope; listings add `count` and `pagination`.
pub mod auth;
pub mod engagement;
pub mod form;
pub mod posts;
pub mod users;

use crate::error::AppError;
use crate::models::Page;
use crate::services::ServiceRegistry;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

/// `?page=&limit=` on listing routes; unparsable values count as absent
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default, deserialize_with = "lenient_number")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub limit: Option<i64>,
}

fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| v.trim().parse().ok()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub pages: i64,
    pub current_page: i64,
}

pub(crate) fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "success": true, "data": data }))
}

pub(crate) fn created<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Created().json(serde_json::json!({ "success": true, "data": data }))
}

pub(crate) fn page<T: Serialize>(page: Page<T>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": page.items.len(),
        "data": page.items,
        "pagination": Pagination {
            total: page.total,
            pages: page.pages,
            current_page: page.current_page,
        },
    }))
}

/// Register services and every `/api/v1` route
pub fn configure_app(cfg: &mut web::ServiceConfig, registry: &ServiceRegistry) {
    cfg.app_data(web::Data::from(registry.auth.clone()))
        .app_data(web::Data::from(registry.accounts.clone()))
        .app_data(web::Data::from(registry.content.clone()))
        .app_data(web::Data::from(registry.engagement.clone()))
        .app_data(web::Data::from(registry.feed.clone()))
        .app_data(
            web::PathConfig::default()
                .error_handler(|err, _| AppError::validation(err.to_string()).into()),
        )
        .app_data(
            web::JsonConfig::default()
                .limit(64 * 1024)
                .error_handler(|err, _| AppError::validation(err.to_string()).into()),
        )
        .app_data(
            web::QueryConfig::default()
                .error_handler(|err, _| AppError::validation(err.to_string()).into()),
        )
        .service(
            web::scope("/api/v1")
                .service(
                    web::scope("/auth")
                        .service(
                            web::resource("/register")
                                .route(
                                    web::post()
                                        .guard(actix_web::guard::fn_guard(auth::is_multipart))
                                        .to(auth::register_with_avatar),
                                )
                                .route(web::post().to(auth::register)),
                        )
                        .route("/login", web::post().to(auth::login)),
                )
                .service(
                    web::scope("/users")
                        .service(
                            web::resource("/me")
                                .route(web::get().to(users::get_me))
                                .route(web::put().to(users::update_me)),
                        )
                        .route("/{user_id}", web::get().to(users::get_user))
                        .route("/{user_id}/posts", web::get().to(users::get_user_posts)),
                )
                .service(
                    web::scope("/posts")
                        .service(
                            web::resource("")
                                .route(web::get().to(posts::list_posts))
                                .route(web::post().to(posts::create_post)),
                        )
                        .service(
                            web::resource("/{post_id}")
                                .route(web::get().to(posts::get_post))
                                .route(web::put().to(posts::update_post))
                                .route(web::patch().to(posts::update_post))
                                .route(web::delete().to(posts::delete_post)),
                        )
                        .route("/{post_id}/views", web::post().to(posts::record_view))
                        .route("/{post_id}/like", web::post().to(engagement::toggle_like))
                        .route("/{post_id}/comment", web::post().to(engagement::add_comment))
                        .route(
                            "/{post_id}/comment/{comment_id}",
                            web::delete().to(engagement::delete_comment),
                        ),
                ),
        );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(query: &str) -> ListQuery {
        web::Query::<ListQuery>::from_query(query).unwrap().into_inner()
    }

    #[test]
    fn test_list_query_is_lenient() {
        let q = parse("page=3&limit=25");
        assert_eq!((q.page, q.limit), (Some(3), Some(25)));

        let q = parse("page=abc&limit=");
        assert_eq!((q.page, q.limit), (None, None));

        let q = parse("page=-2");
        assert_eq!((q.page, q.limit), (Some(-2), None));

        let q = parse("");
        assert_eq!((q.page, q.limit), (None, None));
    }
}
