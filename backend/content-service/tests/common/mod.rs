//! Shared fixtures for HTTP-level integration tests
//!
//! - `RecordingObjectStore`: in-memory object store that counts every call
//! - `registry`: services wired over `MemoryStore`, no external systems
//! - `MultipartBody`: hand-built `multipart/form-data` payloads

#![allow(dead_code)]

use async_trait::async_trait;
use content_service::config::{FeedConfig, MediaConfig};
use content_service::db::MemoryStore;
use content_service::media::{ObjectStore, ObjectStoreError};
use content_service::services::ServiceRegistry;
use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgb};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

static JWT: Once = Once::new();

pub fn init_jwt() {
    JWT.call_once(|| {
        crypto_core::jwt::initialize_jwt_secret("content-service-integration-secret", 3600)
            .expect("jwt init");
    });
}

/// Object store double: keeps object sizes by key and counts calls
#[derive(Default)]
pub struct RecordingObjectStore {
    objects: Mutex<HashMap<String, u64>>,
    put_calls: Mutex<usize>,
    deleted: Mutex<Vec<String>>,
    failing: AtomicBool,
    stall: Mutex<Option<Duration>>,
}

impl RecordingObjectStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every subsequent put fail as if the store were down
    pub fn fail_puts(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Make every subsequent put hang for `delay` before completing
    pub fn stall_puts(&self, delay: Duration) {
        *self.stall.lock().unwrap() = Some(delay);
    }

    pub fn put_calls(&self) -> usize {
        *self.put_calls.lock().unwrap()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    /// Background releases are spawned; poll until `n` deletes were seen
    pub async fn wait_for_deletes(&self, n: usize) -> Vec<String> {
        for _ in 0..100 {
            if self.deleted.lock().unwrap().len() >= n {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.deleted()
    }

    async fn record_put(&self, key: &str, size: u64) -> Result<String, ObjectStoreError> {
        *self.put_calls.lock().unwrap() += 1;
        let stall = *self.stall.lock().unwrap();
        if let Some(delay) = stall {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::Unavailable("connection refused".into()));
        }
        self.objects.lock().unwrap().insert(key.to_string(), size);
        Ok(format!("https://media.test/{}", key))
    }
}

#[async_trait]
impl ObjectStore for RecordingObjectStore {
    async fn put_file(
        &self,
        key: &str,
        source: &Path,
        _content_type: &str,
    ) -> Result<String, ObjectStoreError> {
        let size = tokio::fs::metadata(source)
            .await
            .map_err(|e| ObjectStoreError::Unavailable(e.to_string()))?
            .len();
        self.record_put(key, size).await
    }

    async fn put_bytes(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, ObjectStoreError> {
        self.record_put(key, bytes.len() as u64).await
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        self.objects.lock().unwrap().remove(key);
        self.deleted.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

/// Services over a fresh in-memory store with default limits
pub fn registry(object_store: Arc<RecordingObjectStore>) -> ServiceRegistry {
    registry_with(object_store, MediaConfig::default())
}

pub fn registry_with(object_store: Arc<RecordingObjectStore>, media: MediaConfig) -> ServiceRegistry {
    init_jwt();
    ServiceRegistry::new(
        Arc::new(MemoryStore::new()),
        object_store,
        &media,
        FeedConfig::default(),
    )
}

pub fn png_bytes() -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(64, 48, Rgb([200, 120, 40])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
        .unwrap();
    buf
}

/// Builder for `multipart/form-data` request bodies
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: "----lumo-test-boundary-7MA4YWxkTrZu0gW".to_string(),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                self.boundary, name, filename, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// `(content-type header, body)`
    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// `test_app!(registry)`: initialise the full `/api/v1` route table
macro_rules! test_app {
    ($registry:expr) => {
        actix_web::test::init_service(actix_web::App::new().configure(|cfg| {
            content_service::handlers::configure_app(cfg, &$registry)
        }))
        .await
    };
}

/// `register!(app, name, email)`: register through the API, yields `(token, user_id)`
macro_rules! register {
    ($app:expr, $name:expr, $email:expr) => {{
        let req = actix_web::test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(serde_json::json!({
                "name": $name,
                "email": $email,
                "password": "correct horse battery",
            }))
            .to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::CREATED);
        let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
        let token = body["token"].as_str().unwrap().to_string();
        let id: uuid::Uuid = body["data"]["id"].as_str().unwrap().parse().unwrap();
        (token, id)
    }};
}

/// `multipart_request!(method, uri, token, body)`: a request carrying a `MultipartBody`
macro_rules! multipart_request {
    ($method:ident, $uri:expr, $token:expr, $body:expr) => {{
        let (content_type, payload) = $body.finish();
        actix_web::test::TestRequest::$method()
            .uri($uri)
            .insert_header($crate::common::bearer($token))
            .insert_header(("Content-Type", content_type))
            .set_payload(payload)
            .to_request()
    }};
}
