/// Integration tests for crypto-core credential functionality
///
/// This test module covers:
/// - Access token issue and validation through the public API
/// - Expired versus invalid token classification
/// - Password hashing round trip used by account registration and login
use chrono::{Duration, Utc};
use crypto_core::jwt::{
    generate_access_token, generate_token_expiring_at, get_user_id_from_token,
    initialize_jwt_secret, is_initialized, token_ttl_secs, validate_token, JwtError,
};
use crypto_core::password::{hash_password, verify_password};
use std::sync::Once;
use uuid::Uuid;

// FOR TESTING ONLY
const TEST_SECRET: &str = "integration-test-secret-with-at-least-32-bytes";
const TEST_TTL_SECS: i64 = 7 * 24 * 3600;

fn init_test_secret() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        initialize_jwt_secret(TEST_SECRET, TEST_TTL_SECS)
            .expect("Failed to initialize test secret");
    });
}

// ============================================================================
// Token Generation Tests
// ============================================================================

#[test]
fn test_token_issue_and_validate() {
    init_test_secret();
    assert!(is_initialized());

    let user_id = Uuid::new_v4();
    let token = generate_access_token(user_id).expect("Should generate access token");

    let claims = validate_token(&token).expect("Fresh token should validate");
    assert_eq!(claims.sub, user_id.to_string());
    assert!(claims.exp > Utc::now().timestamp());
    assert_eq!(token_ttl_secs().unwrap(), TEST_TTL_SECS);
}

#[test]
fn test_distinct_users_get_distinct_tokens() {
    init_test_secret();

    let a = generate_access_token(Uuid::new_v4()).unwrap();
    let b = generate_access_token(Uuid::new_v4()).unwrap();
    assert_ne!(a, b);
}

// ============================================================================
// Token Validation Tests
// ============================================================================

#[test]
fn test_expired_token() {
    init_test_secret();

    let token =
        generate_token_expiring_at(Uuid::new_v4(), Utc::now() - Duration::seconds(30)).unwrap();

    assert_eq!(validate_token(&token).unwrap_err(), JwtError::Expired);
    assert_eq!(get_user_id_from_token(&token).unwrap_err(), JwtError::Expired);
}

#[test]
fn test_malformed_tokens_are_invalid() {
    init_test_secret();

    for token in ["", "abc", "a.b.c", "eyJhbGciOiJIUzI1NiJ9.e30."] {
        assert!(
            matches!(validate_token(token), Err(JwtError::Invalid(_))),
            "token {token:?} should be invalid"
        );
    }
}

#[test]
fn test_payload_swap_breaks_signature() {
    init_test_secret();

    let victim = generate_access_token(Uuid::new_v4()).unwrap();
    let attacker = generate_access_token(Uuid::new_v4()).unwrap();

    let victim_parts: Vec<&str> = victim.split('.').collect();
    let attacker_parts: Vec<&str> = attacker.split('.').collect();
    let forged = format!(
        "{}.{}.{}",
        victim_parts[0], victim_parts[1], attacker_parts[2]
    );

    assert!(matches!(validate_token(&forged), Err(JwtError::Invalid(_))));
}

// ============================================================================
// Password Tests
// ============================================================================

#[test]
fn test_password_round_trip() {
    let hash = hash_password("s3cure-passphrase").unwrap();
    assert!(verify_password("s3cure-passphrase", &hash).unwrap());
    assert!(!verify_password("S3CURE-PASSPHRASE", &hash).unwrap());
}
