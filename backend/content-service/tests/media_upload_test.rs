// Upload validation and object store failure handling over HTTP
//
//   cargo test -p content-service --test media_upload_test

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::{png_bytes, MultipartBody, RecordingObjectStore};
use serde_json::Value;

/// Total number of posts as reported by the feed
macro_rules! post_total {
    ($app:expr) => {{
        let req = test::TestRequest::get().uri("/api/v1/posts").to_request();
        let body: Value = test::call_and_read_body_json(&$app, req).await;
        body["pagination"]["total"].as_i64().unwrap()
    }};
}

#[actix_web::test]
async fn test_oversized_upload_rejected_before_store() {
    let store = RecordingObjectStore::new();
    let registry = common::registry(store.clone());
    let app = test_app!(registry);
    let (token, _) = register!(app, "Ana", "ana@example.com");

    let big = vec![0xffu8; 6 * 1024 * 1024];
    let req = multipart_request!(
        post,
        "/api/v1/posts",
        &token,
        MultipartBody::new()
            .text("title", "Too big")
            .file("image", "huge.jpg", "image/jpeg", &big)
    );
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().starts_with("File too large"));

    assert_eq!(store.put_calls(), 0);
    assert_eq!(post_total!(app), 0);
}

#[actix_web::test]
async fn test_unsupported_type_and_missing_image() {
    let store = RecordingObjectStore::new();
    let registry = common::registry(store.clone());
    let app = test_app!(registry);
    let (token, _) = register!(app, "Ana", "ana@example.com");

    let req = multipart_request!(
        post,
        "/api/v1/posts",
        &token,
        MultipartBody::new()
            .text("title", "Bitmap")
            .file("image", "old.bmp", "image/bmp", b"BM fake bitmap")
    );
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Unsupported file type"));

    let req = multipart_request!(
        post,
        "/api/v1/posts",
        &token,
        MultipartBody::new().text("title", "No picture")
    );
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Title is checked before anything is uploaded
    let req = multipart_request!(
        post,
        "/api/v1/posts",
        &token,
        MultipartBody::new().file("image", "a.png", "image/png", &png_bytes())
    );
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert_eq!(store.put_calls(), 0);
    assert_eq!(post_total!(app), 0);
}

#[actix_web::test]
async fn test_store_outage_creates_nothing() {
    let store = RecordingObjectStore::new();
    store.fail_puts();
    let registry = common::registry(store.clone());
    let app = test_app!(registry);
    let (token, _) = register!(app, "Ana", "ana@example.com");

    let req = multipart_request!(
        post,
        "/api/v1/posts",
        &token,
        MultipartBody::new()
            .text("title", "Sunset")
            .file("image", "sunset.png", "image/png", &png_bytes())
    );
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 502);

    assert_eq!(store.put_calls(), 1);
    assert_eq!(store.object_count(), 0);
    assert_eq!(post_total!(app), 0);
}

#[actix_web::test]
async fn test_avatar_replacement_releases_previous() {
    let store = RecordingObjectStore::new();
    let registry = common::registry(store.clone());
    let app = test_app!(registry);
    let (token, user_id) = register!(app, "Ana", "ana@example.com");

    let req = multipart_request!(
        put,
        "/api/v1/users/me",
        &token,
        MultipartBody::new()
            .text("bio", "Shoots film")
            .file("avatar", "me.png", "image/png", &png_bytes())
    );
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let first_url = body["data"]["avatarUrl"].as_str().unwrap().to_string();
    assert!(first_url.starts_with(&format!("https://media.test/avatars/{}/", user_id)));
    assert_eq!(body["data"]["bio"], "Shoots film");
    assert_eq!(body["data"]["name"], "Ana");
    // Avatars get no thumbnail
    assert_eq!(store.put_calls(), 1);

    let first_key = first_url.trim_start_matches("https://media.test/").to_string();
    assert!(store.contains(&first_key));

    let req = multipart_request!(
        put,
        "/api/v1/users/me",
        &token,
        MultipartBody::new().file("avatar", "me2.png", "image/png", &png_bytes())
    );
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let second_url = body["data"]["avatarUrl"].as_str().unwrap().to_string();
    assert_ne!(first_url, second_url);
    assert_eq!(body["data"]["bio"], "Shoots film");

    let deleted = store.wait_for_deletes(1).await;
    assert_eq!(deleted, vec![first_key.clone()]);
    assert!(!store.contains(&first_key));

    // Public profile reflects the new avatar
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/users/{}", user_id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["avatarUrl"], second_url);
}

#[actix_web::test]
async fn test_upload_timeout_creates_nothing() {
    let store = RecordingObjectStore::new();
    store.stall_puts(std::time::Duration::from_secs(30));
    let media = content_service::config::MediaConfig {
        upload_timeout_secs: 1,
        ..Default::default()
    };
    let registry = common::registry_with(store.clone(), media);
    let app = test_app!(registry);
    let (token, _) = register!(app, "Ana", "ana@example.com");

    let started = std::time::Instant::now();
    let req = multipart_request!(
        post,
        "/api/v1/posts",
        &token,
        MultipartBody::new()
            .text("title", "Sunset")
            .file("image", "sunset.png", "image/png", &png_bytes())
    );
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert!(started.elapsed() < std::time::Duration::from_secs(10));

    assert_eq!(store.put_calls(), 1);
    assert_eq!(store.object_count(), 0);
    assert_eq!(post_total!(app), 0);
}

#[actix_web::test]
async fn test_register_with_avatar_upload() {
    let store = RecordingObjectStore::new();
    let registry = common::registry(store.clone());
    let app = test_app!(registry);

    let (content_type, payload) = MultipartBody::new()
        .text("name", "Ana")
        .text("email", "ana@example.com")
        .text("password", "correct horse battery")
        .text("bio", "Shoots film")
        .file("avatar", "me.png", "image/png", &png_bytes())
        .finish();
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .insert_header(("Content-Type", content_type))
        .set_payload(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let token = body["token"].as_str().unwrap().to_string();
    let avatar_url = body["data"]["avatarUrl"].as_str().unwrap().to_string();
    assert!(avatar_url.starts_with("https://media.test/avatars/"));
    assert_eq!(body["data"]["bio"], "Shoots film");
    assert_eq!(store.put_calls(), 1);
    assert!(store.contains(avatar_url.trim_start_matches("https://media.test/")));

    let req = test::TestRequest::get()
        .uri("/api/v1/users/me")
        .insert_header(common::bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["avatarUrl"], avatar_url);

    // A duplicate sign-up is refused before its avatar is uploaded
    let (content_type, payload) = MultipartBody::new()
        .text("name", "Ana again")
        .text("email", "ana@example.com")
        .text("password", "correct horse battery")
        .file("avatar", "me.png", "image/png", &png_bytes())
        .finish();
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .insert_header(("Content-Type", content_type))
        .set_payload(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(store.put_calls(), 1);

    // Avatar constraints still apply at sign-up
    let (content_type, payload) = MultipartBody::new()
        .text("name", "Ben")
        .text("email", "ben@example.com")
        .text("password", "correct horse battery")
        .file("avatar", "me.bmp", "image/bmp", b"BM")
        .finish();
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .insert_header(("Content-Type", content_type))
        .set_payload(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.put_calls(), 1);
}
