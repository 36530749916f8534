/// Bearer-token identity gate
///
/// Identity is re-derived from the token on every request; there is no session
/// store. A token is only as good as the user row it names.
use crate::db::UserRepository;
use crate::error::{AuthError, Result};
use crate::models::User;
use std::sync::Arc;
use uuid::Uuid;

/// An authenticated caller
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub user: User,
}

#[derive(Clone)]
pub struct AuthGate {
    users: Arc<dyn UserRepository>,
}

impl AuthGate {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Resolve an `Authorization` header value to an identity
    pub async fn verify(&self, authorization: Option<&str>) -> Result<Identity> {
        let token = authorization
            .and_then(bearer_token)
            .ok_or(AuthError::Missing)?;

        let user_id = crypto_core::jwt::get_user_id_from_token(token)?;
        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(Identity { user_id, user })
    }

    /// Sign a fresh access token for `user_id`
    pub fn issue_token(&self, user_id: Uuid) -> Result<String> {
        Ok(crypto_core::jwt::generate_access_token(user_id)?)
    }
}

/// Token part of a `Bearer <token>` header; `None` for other schemes or an empty token
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
