/// Likes and comments on posts
use crate::db::{CommentRepository, PostRepository};
use crate::error::{AppError, Result};
use crate::metrics::engagement::{POST_COMMENTS_TOTAL, POST_LIKES_TOGGLED_TOTAL};
use crate::models::CommentView;
use crate::services::populate::PostPopulator;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Longest accepted comment, in characters
pub const MAX_COMMENT_CHARS: usize = 2000;

pub struct EngagementService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    populator: PostPopulator,
}

impl EngagementService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        populator: PostPopulator,
    ) -> Self {
        Self {
            posts,
            comments,
            populator,
        }
    }

    /// Flip `user_id`'s like on the post; returns the resulting like set
    pub async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Vec<Uuid>> {
        let likes = self
            .posts
            .toggle_like(post_id, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))?;

        let action = if likes.contains(&user_id) { "like" } else { "unlike" };
        POST_LIKES_TOGGLED_TOTAL.with_label_values(&[action]).inc();
        debug!(post_id = %post_id, user_id = %user_id, action, "Like toggled");
        Ok(likes)
    }

    /// Append a comment; returns all comments of the post, newest first
    pub async fn add_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        text: &str,
    ) -> Result<Vec<CommentView>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::validation("Comment text is required"));
        }
        if text.chars().count() > MAX_COMMENT_CHARS {
            return Err(AppError::validation(format!(
                "Comment must be at most {} characters",
                MAX_COMMENT_CHARS
            )));
        }

        self.comments
            .append_comment(post_id, author_id, text)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))?;

        POST_COMMENTS_TOTAL.with_label_values(&["added"]).inc();
        debug!(post_id = %post_id, user_id = %author_id, "Comment added");
        self.comment_list(post_id).await
    }

    /// Author-only removal; returns the remaining comments, newest first
    pub async fn delete_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        actor: Uuid,
    ) -> Result<Vec<CommentView>> {
        if self.posts.find_post(post_id).await?.is_none() {
            return Err(AppError::not_found("Post not found"));
        }
        let comment = self
            .comments
            .find_comment(post_id, comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment not found"))?;
        if comment.author_id != actor {
            return Err(AppError::Forbidden(
                "Not authorized to delete this comment".to_string(),
            ));
        }

        if !self
            .comments
            .delete_comment(post_id, comment_id, actor)
            .await?
        {
            return Err(AppError::not_found("Comment not found"));
        }

        POST_COMMENTS_TOTAL.with_label_values(&["deleted"]).inc();
        debug!(post_id = %post_id, comment_id = %comment_id, "Comment deleted");
        self.comment_list(post_id).await
    }

    async fn comment_list(&self, post_id: Uuid) -> Result<Vec<CommentView>> {
        let comments = self.comments.list_comments(post_id).await?;
        self.populator.comment_views(comments).await
    }
}
