/// Shared S3 utilities for Lumo services
///
/// Provides the AWS S3 client, configuration and object operations used by the
/// media pipeline's object store.
use aws_sdk_s3::Client;
use std::sync::Arc;

pub mod config;
pub mod operations;

pub use config::S3Config;
pub use operations::{S3Error, S3Operations};

/// Build an S3 client honouring region, custom endpoint and path-style settings
pub async fn build_client(config: &S3Config) -> Arc<Client> {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.region.clone()));
    if let Some(endpoint) = &config.endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }
    let sdk_config = loader.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(config.path_style)
        .build();

    tracing::debug!(bucket = %config.bucket, region = %config.region, "S3 client built");
    Arc::new(Client::from_conf(s3_config))
}

/// Build the client and wrap it in `S3Operations` in one step
pub async fn connect(config: S3Config) -> S3Operations {
    let client = build_client(&config).await;
    S3Operations::new(client, config)
}
