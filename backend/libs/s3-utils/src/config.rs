/// S3 configuration shared across services
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,
    /// AWS region
    pub region: String,
    /// Base URL for public access (CDN domain or S3 endpoint)
    pub base_url: String,
    /// Whether to use path-style URLs (false = virtual-hosted-style)
    pub path_style: bool,
    /// Custom S3 endpoint (MinIO, LocalStack); None uses AWS
    pub endpoint_url: Option<String>,
}

impl S3Config {
    /// Load S3 configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            bucket: std::env::var("S3_BUCKET").unwrap_or_else(|_| "lumo-media".to_string()),
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            base_url: std::env::var("S3_BASE_URL")
                .unwrap_or_else(|_| "https://s3.amazonaws.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            path_style: std::env::var("S3_PATH_STYLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            endpoint_url: std::env::var("S3_ENDPOINT_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        }
    }

    /// Publicly reachable URL of an object
    pub fn object_url(&self, key: &str) -> String {
        if self.path_style {
            format!("{}/{}/{}", self.base_url, self.bucket, key)
        } else {
            format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket, self.region, key)
        }
    }

    /// Recover the object key from a URL produced by `object_url`
    pub fn key_from_url(&self, url: &str) -> Option<String> {
        let prefix = if self.path_style {
            format!("{}/{}/", self.base_url, self.bucket)
        } else {
            format!("https://{}.s3.{}.amazonaws.com/", self.bucket, self.region)
        };
        url.strip_prefix(&prefix)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }
}
