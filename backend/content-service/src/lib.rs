/// Content Service Library
///
/// Photo posts, likes, comments and the reverse-chronological feed for the
/// Lumo platform, together with the accounts that own them.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route table
/// - `models`: stored entities and response views
/// - `services`: business logic layer
/// - `db`: repository traits with PostgreSQL and in-memory stores
/// - `media`: upload validation, object storage and thumbnails
/// - `middleware`: identity extraction and request timing
/// - `error`: error types and HTTP mapping
/// - `config`: configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod media;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
