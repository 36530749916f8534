/// Registration, login and profile management
use crate::db::UserRepository;
use crate::error::{AppError, AuthError, Result};
use crate::media::{MediaConstraints, MediaPipeline, MediaRef, UploadedFile};
use crate::models::{non_blank, NewUser, ProfileChanges, UserProfile};
use crate::services::auth_gate::{AuthGate, Identity};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub bio: Option<String>,
}

/// A profile plus a freshly issued access token
#[derive(Debug, Clone)]
pub struct Session {
    pub user: UserProfile,
    pub token: String,
}

pub struct AccountService {
    users: Arc<dyn UserRepository>,
    gate: AuthGate,
    media: Arc<MediaPipeline>,
    avatar_constraints: MediaConstraints,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        gate: AuthGate,
        media: Arc<MediaPipeline>,
        avatar_constraints: MediaConstraints,
    ) -> Self {
        Self {
            users,
            gate,
            media,
            avatar_constraints,
        }
    }

    pub fn avatar_constraints(&self) -> &MediaConstraints {
        &self.avatar_constraints
    }

    /// Create an account, optionally with an avatar. The avatar is stored before
    /// the user row and committed only once the row exists.
    pub async fn register(
        &self,
        registration: Registration,
        avatar: Option<UploadedFile>,
    ) -> Result<Session> {
        let name = registration.name.trim();
        let email = registration.email.trim().to_lowercase();
        if name.is_empty() || email.is_empty() || registration.password.is_empty() {
            return Err(AppError::validation("Name, email and password are required"));
        }
        if !email.contains('@') {
            return Err(AppError::validation("Email address is not valid"));
        }

        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let password = registration.password;
        let password_hash =
            tokio::task::spawn_blocking(move || crypto_core::password::hash_password(&password))
                .await
                .map_err(|e| AppError::Internal(e.to_string()))??;

        // No user id exists yet; the avatar key gets its own prefix
        let pending = match avatar {
            Some(upload) => Some(
                self.media
                    .accept(Uuid::new_v4(), upload, &self.avatar_constraints)
                    .await?,
            ),
            None => None,
        };

        let user = self
            .users
            .create_user(NewUser {
                name: name.to_string(),
                email,
                password_hash,
                bio: non_blank(registration.bio),
                avatar: pending.as_ref().map(|p| p.media().clone()),
            })
            .await?;
        if let Some(pending) = pending {
            pending.commit();
        }

        info!(user_id = %user.id, "User registered");
        let token = self.gate.issue_token(user.id)?;
        Ok(Session {
            user: user.into(),
            token,
        })
    }

    /// Unknown email and wrong password fail identically
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.is_empty() {
            return Err(AppError::validation("Email and password are required"));
        }

        let user = self
            .users
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::BadCredentials)?;

        let password = password.to_string();
        let hash = user.password_hash.clone();
        let matches =
            tokio::task::spawn_blocking(move || crypto_core::password::verify_password(&password, &hash))
                .await
                .map_err(|e| AppError::Internal(e.to_string()))??;
        if !matches {
            return Err(AuthError::BadCredentials.into());
        }

        let token = self.gate.issue_token(user.id)?;
        Ok(Session {
            user: user.into(),
            token,
        })
    }

    pub fn me(&self, identity: &Identity) -> UserProfile {
        identity.user.clone().into()
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfile> {
        self.users
            .find_user(user_id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Blank fields are ignored; a new avatar replaces and releases the old one
    pub async fn update_profile(
        &self,
        identity: &Identity,
        name: Option<String>,
        bio: Option<String>,
        avatar: Option<UploadedFile>,
    ) -> Result<UserProfile> {
        let pending = match avatar {
            Some(upload) => Some(
                self.media
                    .accept(identity.user_id, upload, &self.avatar_constraints)
                    .await?,
            ),
            None => None,
        };

        let changes = ProfileChanges {
            name: non_blank(name),
            bio: non_blank(bio),
            avatar: pending.as_ref().map(|p| p.media().clone()),
        };

        let user = self
            .users
            .update_profile(identity.user_id, changes)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if let Some(pending) = pending {
            pending.commit();
            if let (Some(url), Some(key)) = (
                identity.user.avatar_url.clone(),
                identity.user.avatar_key.clone(),
            ) {
                self.media.release_in_background(MediaRef {
                    url,
                    key,
                    thumbnail_url: None,
                    thumbnail_key: None,
                });
            }
        }

        info!(user_id = %user.id, "Profile updated");
        Ok(user.into())
    }
}
