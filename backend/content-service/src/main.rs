use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::Context;
use chrono::Utc;
use content_service::db::PgStore;
use content_service::handlers;
use content_service::media::S3ObjectStore;
use content_service::middleware::RequestTiming;
use content_service::openapi::ApiDoc;
use content_service::services::ServiceRegistry;
use content_service::Config;
use db_pool::{create_pool, DbConfig};
use s3_utils::{S3Config, S3Operations};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

struct HealthState {
    db_pool: sqlx::PgPool,
    s3: S3Operations,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    latency_ms: u64,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    checks: HashMap<String, ComponentCheck>,
    timestamp: String,
}

impl HealthState {
    async fn check_postgres(&self) -> Result<(), String> {
        sqlx::query("SELECT 1")
            .execute(&self.db_pool)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    async fn check_object_store(&self) -> Result<(), String> {
        self.s3.health_check().await.map_err(|e| e.to_string())
    }
}

fn component(result: Result<(), String>, started: Instant, what: &str) -> ComponentCheck {
    let latency_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(()) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: format!("{} reachable", what),
            latency_ms,
        },
        Err(e) => ComponentCheck {
            status: ComponentStatus::Unhealthy,
            message: format!("{} check failed: {}", what, e),
            latency_ms,
        },
    }
}

async fn health_summary(state: web::Data<HealthState>) -> HttpResponse {
    let mut checks = HashMap::new();

    let started = Instant::now();
    checks.insert(
        "postgresql".to_string(),
        component(state.check_postgres().await, started, "PostgreSQL"),
    );
    let started = Instant::now();
    checks.insert(
        "object_store".to_string(),
        component(state.check_object_store().await, started, "Object store"),
    );

    let ready = checks
        .values()
        .all(|c| matches!(c.status, ComponentStatus::Healthy));
    let response = ReadinessResponse {
        ready,
        status: if ready {
            ComponentStatus::Healthy
        } else {
            ComponentStatus::Unhealthy
        },
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "alive": true,
        "service": "content-service",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn openapi_json(doc: web::Data<utoipa::openapi::OpenApi>) -> actix_web::Result<HttpResponse> {
    let body = serde_json::to_string(&*doc).map_err(|e| {
        tracing::error!("OpenAPI serialization failed: {}", e);
        actix_web::error::ErrorInternalServerError("OpenAPI serialization error")
    })?;

    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(body))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable ({}), waiting for Ctrl+C", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn cors(allowed_origins: &str) -> Cors {
    let mut cors = Cors::default();
    for origin in allowed_origins.split(',') {
        let origin = origin.trim();
        if origin == "*" {
            cors = cors.allow_any_origin();
        } else if !origin.is_empty() {
            cors = cors.allowed_origin(origin);
        }
    }
    cors.allow_any_method().allow_any_header().max_age(3600)
}

/// Content Service
///
/// Serves photo posts, likes, comments, the paginated feed and the accounts
/// that own them. Everything lives under `/api/v1`; `/metrics` exposes
/// Prometheus counters.
///
/// Startup order: configuration, signing secret, PostgreSQL pool and
/// migrations, object store client, then the HTTP server.
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Config::from_env()
        .map_err(anyhow::Error::msg)
        .context("Failed to load configuration")?;

    tracing::info!("Starting content-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    crypto_core::jwt::initialize_jwt_secret(&config.auth.jwt_secret, config.auth.token_ttl_secs)
        .context("Failed to initialize JWT signing")?;

    let db_cfg = DbConfig::from_env("content-service").unwrap_or_else(|_| DbConfig {
        service_name: "content-service".to_string(),
        database_url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..DbConfig::default()
    });
    db_cfg.log_config();
    let db_pool = create_pool(db_cfg)
        .await
        .context("Failed to create database pool")?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    let s3_ops = s3_utils::connect(S3Config::from_env()).await;
    if let Err(e) = s3_ops.health_check().await {
        tracing::warn!("Object store not reachable at startup: {}", e);
    }

    let registry = ServiceRegistry::new(
        Arc::new(PgStore::new(db_pool.clone())),
        Arc::new(S3ObjectStore::new(s3_ops.clone())),
        &config.media,
        config.feed,
    );

    let health_state = web::Data::new(HealthState {
        db_pool: db_pool.clone(),
        s3: s3_ops,
    });
    let openapi_doc = web::Data::new(ApiDoc::openapi());

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(openapi_doc.clone())
            .app_data(health_state.clone())
            .wrap(RequestTiming)
            .wrap(cors(&allowed_origins))
            .wrap(tracing_actix_web::TracingLogger::default())
            .route(ApiDoc::openapi_json_path(), web::get().to(openapi_json))
            .route(
                "/metrics",
                web::get().to(content_service::metrics::serve_metrics),
            )
            .route("/api/v1/health", web::get().to(health_summary))
            .route("/api/v1/health/live", web::get().to(liveness_check))
            .configure(|cfg| handlers::configure_app(cfg, &registry))
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    let server_handle = server.handle();
    let server_task = actix_web::rt::spawn(server);

    tokio::select! {
        result = server_task => {
            result
                .context("HTTP server task panicked")?
                .context("HTTP server failed")?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
        }
    }

    db_pool.close().await;
    tracing::info!("Content-service shutting down");
    Ok(())
}
