//! Shared JWT module for Lumo services
//!
//! Access tokens are HS256-signed with a secret held by the server. A token only
//! carries the subject (user id) and its validity window; every request re-derives
//! the caller's identity from it, so no session state is kept anywhere.
//!
//! ## Usage
//!
//! Services call `initialize_jwt_secret()` once during startup:
//!
//! ```rust,ignore
//! use crypto_core::jwt;
//!
//! let secret = std::env::var("JWT_SECRET")?;
//! jwt::initialize_jwt_secret(&secret, 7 * 24 * 3600)?;
//!
//! let token = jwt::generate_access_token(user_id)?;
//! let claims = jwt::validate_token(&token)?;
//! ```
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// JWT algorithm - symmetric, the secret never leaves the server
const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// Default token lifetime when the caller does not configure one (7 days)
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 7 * 24 * 3600;

// ============================================================================
// Data Structures
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JwtError {
    #[error("JWT secret not initialized. Call initialize_jwt_secret() during startup.")]
    NotInitialized,

    #[error("JWT secret already initialized")]
    AlreadyInitialized,

    #[error("JWT secret must not be empty")]
    EmptySecret,

    #[error("token lifetime must be positive")]
    InvalidLifetime,

    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// JWT claims: subject plus validity window
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Parse the subject as a user id
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub)
            .map_err(|e| JwtError::Invalid(format!("subject is not a user id: {e}")))
    }
}

// ============================================================================
// Key Storage
// ============================================================================

struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

/// Initialized once at startup, immutable thereafter
static JWT_KEYS: OnceCell<JwtKeys> = OnceCell::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize the signing secret and the lifetime of issued tokens
///
/// Can only be called once - subsequent calls return `JwtError::AlreadyInitialized`.
pub fn initialize_jwt_secret(secret: &str, ttl_secs: i64) -> Result<(), JwtError> {
    if secret.is_empty() {
        return Err(JwtError::EmptySecret);
    }
    if ttl_secs <= 0 {
        return Err(JwtError::InvalidLifetime);
    }

    let keys = JwtKeys {
        encoding: EncodingKey::from_secret(secret.as_bytes()),
        decoding: DecodingKey::from_secret(secret.as_bytes()),
        ttl: Duration::seconds(ttl_secs),
    };

    JWT_KEYS
        .set(keys)
        .map_err(|_| JwtError::AlreadyInitialized)?;

    tracing::debug!(ttl_secs, "JWT secret initialized");
    Ok(())
}

/// Whether `initialize_jwt_secret()` has already run
pub fn is_initialized() -> bool {
    JWT_KEYS.get().is_some()
}

fn keys() -> Result<&'static JwtKeys, JwtError> {
    JWT_KEYS.get().ok_or(JwtError::NotInitialized)
}

/// Lifetime of newly issued tokens, in seconds
pub fn token_ttl_secs() -> Result<i64, JwtError> {
    Ok(keys()?.ttl.num_seconds())
}

// ============================================================================
// Token Generation
// ============================================================================

/// Generate an access token for `user_id` valid for the configured lifetime
pub fn generate_access_token(user_id: Uuid) -> Result<String, JwtError> {
    let expires_at = Utc::now() + keys()?.ttl;
    generate_token_expiring_at(user_id, expires_at)
}

/// Generate a token with an explicit expiry
///
/// Used by `generate_access_token`; also lets callers mint short-lived or
/// already-expired tokens (e.g. in tests).
pub fn generate_token_expiring_at(
    user_id: Uuid,
    expires_at: DateTime<Utc>,
) -> Result<String, JwtError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp().min(expires_at.timestamp()),
        exp: expires_at.timestamp(),
    };

    encode(&Header::new(JWT_ALGORITHM), &claims, &keys()?.encoding)
        .map_err(|e| JwtError::Signing(e.to_string()))
}

// ============================================================================
// Token Validation
// ============================================================================

/// Validate signature, structure and expiry of a token
///
/// Expired tokens yield `JwtError::Expired`; every other failure (bad signature,
/// malformed token, wrong algorithm) yields `JwtError::Invalid`.
pub fn validate_token(token: &str) -> Result<Claims, JwtError> {
    let keys = keys()?;

    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.validate_exp = true;
    validation.leeway = 0;

    decode::<Claims>(token, &keys.decoding, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Invalid(e.to_string()),
        })
}

/// Validate a token and return its subject as a user id
pub fn get_user_id_from_token(token: &str) -> Result<Uuid, JwtError> {
    validate_token(token)?.user_id()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "unit-test-secret-0123456789-abcdefghijklmnop";

    fn init_test_keys() {
        static INIT: std::sync::Once = std::sync::Once::new();
        INIT.call_once(|| {
            initialize_jwt_secret(TEST_SECRET, 3600).expect("Failed to initialize test secret");
        });
    }

    #[test]
    fn test_generate_access_token() {
        init_test_keys();

        let token = generate_access_token(Uuid::new_v4()).unwrap();
        assert_eq!(token.matches('.').count(), 2); // JWT has 3 parts
    }

    #[test]
    fn test_validate_valid_token() {
        init_test_keys();

        let user_id = Uuid::new_v4();
        let token = generate_access_token(user_id).unwrap();

        let claims = validate_token(&token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert!((3599..=3600).contains(&(claims.exp - claims.iat)));
    }

    #[test]
    fn test_validate_garbage_token() {
        init_test_keys();

        assert!(matches!(
            validate_token("invalid.token.here"),
            Err(JwtError::Invalid(_))
        ));
    }

    #[test]
    fn test_validate_tampered_token() {
        init_test_keys();

        let token = generate_access_token(Uuid::new_v4()).unwrap();
        let (head, signature) = token.rsplit_once('.').unwrap();
        let flipped: String = signature.chars().rev().collect();
        let tampered = format!("{head}.{flipped}");

        assert!(matches!(validate_token(&tampered), Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_expired_token_is_distinguished() {
        init_test_keys();

        let token =
            generate_token_expiring_at(Uuid::new_v4(), Utc::now() - Duration::minutes(5))
                .unwrap();

        assert_eq!(validate_token(&token), Err(JwtError::Expired));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_invalid() {
        init_test_keys();

        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let foreign = encode(
            &Header::new(JWT_ALGORITHM),
            &claims,
            &EncodingKey::from_secret(b"some-other-secret"),
        )
        .unwrap();

        assert!(matches!(validate_token(&foreign), Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_extract_user_id() {
        init_test_keys();

        let user_id = Uuid::new_v4();
        let token = generate_access_token(user_id).unwrap();
        assert_eq!(get_user_id_from_token(&token).unwrap(), user_id);
    }

    #[test]
    fn test_non_uuid_subject_is_invalid() {
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            iat: 0,
            exp: 1,
        };
        assert!(matches!(claims.user_id(), Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_second_initialization_is_rejected() {
        init_test_keys();

        assert_eq!(
            initialize_jwt_secret("another-secret", 60),
            Err(JwtError::AlreadyInitialized)
        );
        assert_eq!(token_ttl_secs().unwrap(), 3600);
    }
}
