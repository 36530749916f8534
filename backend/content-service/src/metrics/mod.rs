//! Prometheus metrics for content-service.
//!
//! Exposes media and engagement collectors and an HTTP handler for the `/metrics` endpoint.

use actix_web::HttpResponse;
use prometheus::{Encoder, TextEncoder};

pub mod engagement;
pub mod media;

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_metrics_are_exposed() {
        media::MEDIA_UPLOADS_TOTAL.with_label_values(&["accepted"]).inc();
        engagement::POST_LIKES_TOGGLED_TOTAL
            .with_label_values(&["like"])
            .inc();

        let response = serve_metrics().await;
        assert!(response.status().is_success());

        let body = to_bytes(response.into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("media_uploads_total"));
        assert!(text.contains("post_likes_toggled_total"));
    }
}
