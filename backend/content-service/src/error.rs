/// Error types for Content Service
///
/// Every failure a request can hit maps onto one `AppError` variant, which in turn
/// maps onto one HTTP status. Upstream, database and internal failures are logged
/// with their detail and reported to clients with a generic message.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use crypto_core::{JwtError, PasswordError};
use std::fmt;

/// Result type for content-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Malformed or missing client input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0}")]
    Invalid(String),

    #[error("File too large: {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: u64, max: u64 },

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
}

/// Identity could not be established
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Not authorized, no token")]
    Missing,

    #[error("Not authorized, invalid token")]
    Invalid,

    #[error("Not authorized, token expired")]
    Expired,

    #[error("Not authorized, user not found")]
    UserNotFound,

    #[error("Invalid email or password")]
    BadCredentials,
}

/// Application error types
#[derive(Debug)]
pub enum AppError {
    /// Client input rejected before touching any store
    Validation(ValidationError),

    /// Caller identity missing or unusable
    Auth(AuthError),

    /// Caller is not the owner/author of the entity
    Forbidden(String),

    /// Resource not found
    NotFound(String),

    /// Conflict (duplicate registration)
    Conflict(String),

    /// Object Store unreachable, failing or timed out
    Upstream(String),

    /// Persistence Store operation failed
    DatabaseError(String),

    /// Internal server error
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(ValidationError::Invalid(msg.into()))
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    /// Message safe to show to API clients
    fn public_message(&self) -> String {
        match self {
            AppError::Validation(err) => err.to_string(),
            AppError::Auth(err) => err.to_string(),
            AppError::Forbidden(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => {
                msg.clone()
            }
            AppError::Upstream(_) => "Media storage is unavailable, please retry".to_string(),
            AppError::DatabaseError(_) => "Service temporarily unavailable".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(err) => write!(f, "Validation error: {}", err),
            AppError::Auth(err) => write!(f, "Unauthorized: {}", err),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Upstream(msg) => write!(f, "Upstream failure: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::DatabaseError(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        }

        HttpResponse::build(status).json(serde_json::json!({
            "success": false,
            "error": self.public_message(),
            "status": status.as_u16(),
        }))
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let unique_violation = err
            .as_database_error()
            .and_then(|db_err| db_err.code())
            .map(|code| code == "23505")
            .unwrap_or(false);

        if unique_violation {
            AppError::Conflict("Resource already exists".to_string())
        } else {
            AppError::DatabaseError(err.to_string())
        }
    }
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AppError::Auth(AuthError::Expired),
            JwtError::Invalid(_) => AppError::Auth(AuthError::Invalid),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::TooShort(_) => AppError::validation(err.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<actix_multipart::MultipartError> for AppError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        AppError::validation(format!("Malformed multipart body: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(err: AppError) -> serde_json::Value {
        let response = err.error_response();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::validation("bad"), StatusCode::BAD_REQUEST),
            (
                AppError::Validation(ValidationError::TooLarge { size: 6, max: 5 }),
                StatusCode::BAD_REQUEST,
            ),
            (AppError::Auth(AuthError::Expired), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (AppError::not_found("Post"), StatusCode::NOT_FOUND),
            (AppError::Conflict("dup".into()), StatusCode::CONFLICT),
            (AppError::Upstream("s3".into()), StatusCode::BAD_GATEWAY),
            (AppError::DatabaseError("pg".into()), StatusCode::SERVICE_UNAVAILABLE),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status_code(), expected, "{err}");
        }
    }

    #[actix_web::test]
    async fn test_client_error_body_carries_message() {
        let body = body_json(AppError::Auth(AuthError::Missing)).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["status"], 401);
        assert_eq!(body["error"], "Not authorized, no token");
    }

    #[actix_web::test]
    async fn test_upstream_detail_is_not_leaked() {
        let body = body_json(AppError::Upstream("connect to 10.0.0.7:9000 refused".into())).await;
        assert_eq!(body["status"], 502);
        assert!(!body["error"].as_str().unwrap().contains("10.0.0.7"));

        let body = body_json(AppError::DatabaseError("relation posts missing".into())).await;
        assert!(!body["error"].as_str().unwrap().contains("relation"));
    }

    #[test]
    fn test_jwt_error_mapping() {
        assert!(matches!(
            AppError::from(JwtError::Expired),
            AppError::Auth(AuthError::Expired)
        ));
        assert!(matches!(
            AppError::from(JwtError::Invalid("sig".into())),
            AppError::Auth(AuthError::Invalid)
        ));
        assert!(matches!(
            AppError::from(JwtError::NotInitialized),
            AppError::Internal(_)
        ));
    }

    #[test]
    fn test_row_not_found_is_database_error() {
        assert!(matches!(
            AppError::from(sqlx::Error::RowNotFound),
            AppError::DatabaseError(_)
        ));
    }
}
