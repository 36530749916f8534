/// Configuration management for Content Service
///
/// This module loads configuration from environment variables (optionally seeded
/// from a `.env` file by `main`) and rejects unsafe settings in production.
use crate::media::MediaConstraints;
use serde::{Deserialize, Serialize};

/// Minimum JWT secret length accepted in production
const MIN_PRODUCTION_SECRET_BYTES: usize = 32;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Token signing configuration
    pub auth: AuthConfig,
    /// Upload limits and thumbnail geometry
    pub media: MediaConfig,
    /// Pagination defaults
    pub feed: FeedConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    /// Lifetime of issued tokens
    pub token_ttl_secs: i64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}

/// Limits applied by the media pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub post_max_bytes: u64,
    pub post_formats: Vec<String>,
    pub avatar_max_bytes: u64,
    pub avatar_formats: Vec<String>,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    /// Upper bound on a single Object Store put
    pub upload_timeout_secs: u64,
}

impl MediaConfig {
    pub fn post_constraints(&self) -> MediaConstraints {
        MediaConstraints::new("posts", self.post_max_bytes, &self.post_formats).with_thumbnail()
    }

    pub fn avatar_constraints(&self) -> MediaConstraints {
        MediaConstraints::new("avatars", self.avatar_max_bytes, &self.avatar_formats)
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            post_max_bytes: 5 * 1024 * 1024,
            post_formats: split_list("jpg,jpeg,png,gif,webp"),
            avatar_max_bytes: 10 * 1024 * 1024,
            avatar_formats: split_list("jpg,jpeg,png,webp"),
            thumbnail_width: 640,
            thumbnail_height: 360,
            upload_timeout_secs: 30,
        }
    }
}

/// Pagination configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeedConfig {
    pub default_page_size: i64,
    pub max_page_size: i64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");
        let media_defaults = MediaConfig::default();
        let feed_defaults = FeedConfig::default();

        let feed = FeedConfig {
            default_page_size: parse_env_or("FEED_DEFAULT_PAGE_SIZE", feed_defaults.default_page_size)?,
            max_page_size: parse_env_or("FEED_MAX_PAGE_SIZE", feed_defaults.max_page_size)?,
        };
        if feed.max_page_size < 1 || feed.default_page_size < 1 {
            return Err("FEED_* page sizes must be positive".to_string());
        }

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("CONTENT_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("CONTENT_SERVICE_PORT", 8081)?,
            },
            cors: {
                let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                    Ok(value) => value,
                    Err(_) if production => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    Err(_) => "http://localhost:3000".to_string(),
                };

                if production && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/lumo".to_string()),
                max_connections: parse_env_or("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            auth: {
                let jwt_secret = match std::env::var("JWT_SECRET") {
                    Ok(secret) if !secret.trim().is_empty() => secret,
                    _ if production => {
                        return Err("JWT_SECRET must be set in production".to_string())
                    }
                    _ => {
                        tracing::warn!("JWT_SECRET not set; using an insecure development secret");
                        "lumo-development-secret-do-not-use-in-production".to_string()
                    }
                };

                if production && jwt_secret.len() < MIN_PRODUCTION_SECRET_BYTES {
                    return Err(format!(
                        "JWT_SECRET must be at least {} bytes in production",
                        MIN_PRODUCTION_SECRET_BYTES
                    ));
                }

                AuthConfig {
                    jwt_secret,
                    token_ttl_secs: parse_env_or(
                        "JWT_EXPIRY_SECS",
                        crypto_core::jwt::DEFAULT_TOKEN_TTL_SECS,
                    )?,
                }
            },
            media: MediaConfig {
                post_max_bytes: parse_env_or("MEDIA_POST_MAX_BYTES", media_defaults.post_max_bytes)?,
                post_formats: std::env::var("MEDIA_POST_FORMATS")
                    .map(|v| split_list(&v))
                    .unwrap_or(media_defaults.post_formats),
                avatar_max_bytes: parse_env_or(
                    "MEDIA_AVATAR_MAX_BYTES",
                    media_defaults.avatar_max_bytes,
                )?,
                avatar_formats: std::env::var("MEDIA_AVATAR_FORMATS")
                    .map(|v| split_list(&v))
                    .unwrap_or(media_defaults.avatar_formats),
                thumbnail_width: parse_env_or(
                    "MEDIA_THUMBNAIL_WIDTH",
                    media_defaults.thumbnail_width,
                )?,
                thumbnail_height: parse_env_or(
                    "MEDIA_THUMBNAIL_HEIGHT",
                    media_defaults.thumbnail_height,
                )?,
                upload_timeout_secs: parse_env_or(
                    "MEDIA_UPLOAD_TIMEOUT_SECS",
                    media_defaults.upload_timeout_secs,
                )?,
            },
            feed,
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}
