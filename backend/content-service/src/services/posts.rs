/// Post service - handles post creation, retrieval, and management
///
/// Posts only reach the store once their media is safely in the Object Store;
/// media replaced or orphaned by a write is released after the write commits.
use crate::db::PostRepository;
use crate::error::{AppError, Result};
use crate::media::{MediaConstraints, MediaPipeline, MediaRef, UploadedFile};
use crate::models::{normalize_hashtags, non_blank, NewPost, PostChanges, PostView};
use crate::services::populate::PostPopulator;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Text fields of a post as submitted by a client
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Free-form hashtag field, normalised on write
    pub hashtags: Option<String>,
}

pub struct ContentService {
    posts: Arc<dyn PostRepository>,
    media: Arc<MediaPipeline>,
    populator: PostPopulator,
    constraints: MediaConstraints,
}

impl ContentService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        media: Arc<MediaPipeline>,
        populator: PostPopulator,
        constraints: MediaConstraints,
    ) -> Self {
        Self {
            posts,
            media,
            populator,
            constraints,
        }
    }

    /// Upload rules for post media
    pub fn constraints(&self) -> &MediaConstraints {
        &self.constraints
    }

    /// Insert a post around media that is already stored
    pub async fn create(
        &self,
        owner_id: Uuid,
        media: MediaRef,
        title: &str,
        description: Option<String>,
        hashtags: Vec<String>,
    ) -> Result<PostView> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::validation("Title is required"));
        }

        let post = self
            .posts
            .insert_post(NewPost {
                owner_id,
                media,
                title: title.to_string(),
                description: non_blank(description),
                hashtags,
            })
            .await?;

        info!(post_id = %post.id, user_id = %owner_id, "Post created");
        self.populator.populate_one(post).await
    }

    /// Validate, upload, then create; the upload is released if the insert fails
    pub async fn publish(
        &self,
        owner_id: Uuid,
        draft: PostDraft,
        upload: Option<UploadedFile>,
    ) -> Result<PostView> {
        let title = non_blank(draft.title).ok_or_else(|| AppError::validation("Title is required"))?;
        let upload = upload.ok_or_else(|| AppError::validation("An image file is required"))?;

        let pending = self.media.accept(owner_id, upload, &self.constraints).await?;
        let hashtags = draft
            .hashtags
            .as_deref()
            .map(normalize_hashtags)
            .unwrap_or_default();

        let view = self
            .create(
                owner_id,
                pending.media().clone(),
                &title,
                draft.description,
                hashtags,
            )
            .await?;
        pending.commit();
        Ok(view)
    }

    /// Read-only lookup; does not count as a view
    pub async fn get(&self, id: Uuid) -> Result<PostView> {
        let post = self
            .posts
            .find_post(id)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))?;
        self.populator.populate_one(post).await
    }

    pub async fn record_view(&self, id: Uuid) -> Result<i64> {
        self.posts
            .increment_views(id)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))
    }

    /// Owner-only partial update. Blank fields are ignored; a new upload
    /// replaces the media and the previous objects are released afterwards.
    pub async fn update(
        &self,
        id: Uuid,
        actor: Uuid,
        draft: PostDraft,
        upload: Option<UploadedFile>,
    ) -> Result<PostView> {
        let existing = self
            .posts
            .find_post(id)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))?;
        if existing.owner_id != actor {
            return Err(AppError::Forbidden(
                "Not authorized to update this post".to_string(),
            ));
        }

        let pending = match upload {
            Some(upload) => Some(self.media.accept(actor, upload, &self.constraints).await?),
            None => None,
        };

        let changes = PostChanges {
            title: non_blank(draft.title),
            description: non_blank(draft.description),
            hashtags: non_blank(draft.hashtags).map(|raw| normalize_hashtags(&raw)),
            media: pending.as_ref().map(|p| p.media().clone()),
        };
        if changes.is_empty() {
            return self.populator.populate_one(existing).await;
        }

        let updated = self
            .posts
            .update_post(id, actor, changes)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))?;

        if let Some(pending) = pending {
            pending.commit();
            self.media.release_in_background(existing.media());
        }

        info!(post_id = %id, user_id = %actor, "Post updated");
        self.populator.populate_one(updated).await
    }

    /// Owner-only delete; comments go with the post, media is released in the background
    pub async fn delete(&self, id: Uuid, actor: Uuid) -> Result<()> {
        let existing = self
            .posts
            .find_post(id)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))?;
        if existing.owner_id != actor {
            return Err(AppError::Forbidden(
                "Not authorized to delete this post".to_string(),
            ));
        }

        let removed = self
            .posts
            .delete_post(id, actor)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))?;

        self.media.release_in_background(removed.media());
        info!(post_id = %id, user_id = %actor, "Post deleted");
        Ok(())
    }
}
