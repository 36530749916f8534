/// Data models for content-service
///
/// Stored entities (`User`, `Post`, `Comment`) mirror the table rows. Posts
/// reference their owner by id only; response views (`PostView`, `CommentView`,
/// `UserProfile`) are assembled by the populate step in `services::populate`.
use crate::media::MediaRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// =====================================================================
// Stored entities
// =====================================================================

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Always lower-cased
    pub email: String,
    pub password_hash: String,
    pub avatar_url: Option<String>,
    pub avatar_key: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub media_url: String,
    pub media_key: String,
    pub thumbnail_url: Option<String>,
    pub thumbnail_key: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub hashtags: Vec<String>,
    /// Set semantics: membership only, never duplicated
    pub likes: Vec<Uuid>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Stored media of this post, main object and thumbnail
    pub fn media(&self) -> MediaRef {
        MediaRef {
            url: self.media_url.clone(),
            key: self.media_key.clone(),
            thumbnail_url: self.thumbnail_url.clone(),
            thumbnail_key: self.thumbnail_key.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

// =====================================================================
// Write models
// =====================================================================

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub bio: Option<String>,
    /// Avatar already in the Object Store, set at sign-up
    pub avatar: Option<MediaRef>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<MediaRef>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub owner_id: Uuid,
    pub media: MediaRef,
    pub title: String,
    pub description: Option<String>,
    pub hashtags: Vec<String>,
}

/// Partial update; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub hashtags: Option<Vec<String>>,
    pub media: Option<MediaRef>,
}

impl PostChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.hashtags.is_none()
            && self.media.is_none()
    }
}

// =====================================================================
// Response views
// =====================================================================

/// Public summary of a user embedded in posts and comments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl AuthorSummary {
    /// Stand-in for an author row that no longer resolves
    pub fn unknown(id: Uuid) -> Self {
        Self {
            id,
            name: "Unknown user".to_string(),
            avatar_url: None,
        }
    }
}

impl From<&User> for AuthorSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub text: String,
    pub author: AuthorSummary,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Uuid,
    pub owner: AuthorSummary,
    pub media_url: String,
    pub thumbnail_url: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub hashtags: Vec<String>,
    pub likes: Vec<Uuid>,
    /// Newest first
    pub comments: Vec<CommentView>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            avatar_url: user.avatar_url,
            bio: user.bio,
            created_at: user.created_at,
        }
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub pages: i64,
    pub current_page: i64,
}

// =====================================================================
// Input helpers
// =====================================================================

/// Normalise a free-form hashtag field ("#Sun, beach  #sun") into a sorted set
pub fn normalize_hashtags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(|tag| tag.trim().trim_start_matches('#').to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

/// Trim a user-supplied text field; blank becomes `None`
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
