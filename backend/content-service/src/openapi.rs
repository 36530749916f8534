/// OpenAPI documentation for Lumo Content Service
use crate::handlers::auth::{LoginRequest, RegisterRequest};
use crate::handlers::engagement::CommentRequest;
use crate::models::{AuthorSummary, CommentView, PostView, UserProfile};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lumo Content Service API",
        version = "1.0.0",
        description = "Photo posts with likes, comments and a reverse-chronological feed. Media uploads are validated and stored in the object store before a post is created.",
        contact(
            name = "Lumo Team",
            email = "team@lumo.dev"
        ),
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8081", description = "Development server"),
    ),
    tags(
        (name = "health", description = "Service health checks"),
        (name = "auth", description = "Registration and login"),
        (name = "users", description = "Profiles and a user's posts"),
        (name = "posts", description = "Post creation, retrieval, updates and deletion"),
        (name = "engagement", description = "Likes and comments"),
    ),
    components(schemas(
        AuthorSummary,
        CommentView,
        PostView,
        UserProfile,
        RegisterRequest,
        LoginRequest,
        CommentRequest,
    )),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token from /api/v1/auth/login"))
                        .build(),
                ),
            )
        }
    }
}

impl ApiDoc {
    pub fn openapi_json_path() -> &'static str {
        "/api/v1/openapi.json"
    }
}
