/// Database access layer
///
/// - `post_repo`, `comment_repo`, `user_repo`: SQL for each table, as free
///   functions over a `PgPool`
/// - `PgStore`: the PostgreSQL-backed implementation of the repository traits
/// - `memory::MemoryStore`: an in-process implementation with the same atomicity
///   guarantees, used by tests and local development
///
/// Services only ever see the traits.
pub mod comment_repo;
pub mod memory;
pub mod post_repo;
pub mod user_repo;

pub use memory::MemoryStore;

use crate::error::Result;
use crate::models::{Comment, NewPost, NewUser, Post, PostChanges, ProfileChanges, User};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email is taken
    async fn create_user(&self, user: NewUser) -> Result<User>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>>;
    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<Option<User>>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert_post(&self, post: NewPost) -> Result<Post>;
    async fn find_post(&self, id: Uuid) -> Result<Option<Post>>;
    /// Applies only when `owner_id` still owns the post
    async fn update_post(&self, id: Uuid, owner_id: Uuid, changes: PostChanges)
        -> Result<Option<Post>>;
    /// Returns the removed row; comments go with it
    async fn delete_post(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Post>>;
    /// Newest first, id as tie-break
    async fn list_posts(&self, offset: i64, limit: i64) -> Result<Vec<Post>>;
    async fn count_posts(&self) -> Result<i64>;
    async fn list_posts_by_owner(&self, owner_id: Uuid, offset: i64, limit: i64)
        -> Result<Vec<Post>>;
    async fn count_posts_by_owner(&self, owner_id: Uuid) -> Result<i64>;
    /// Atomic increment; `None` if the post does not exist
    async fn increment_views(&self, id: Uuid) -> Result<Option<i64>>;
    /// Atomic membership flip; `None` if the post does not exist
    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<Vec<Uuid>>>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Atomic append; `None` if the post does not exist
    async fn append_comment(&self, post_id: Uuid, author_id: Uuid, text: &str)
        -> Result<Option<Comment>>;
    async fn find_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<Option<Comment>>;
    /// Deletes only when `author_id` wrote the comment
    async fn delete_comment(&self, post_id: Uuid, comment_id: Uuid, author_id: Uuid)
        -> Result<bool>;
    /// Newest first
    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>>;
    /// Newest first within each post
    async fn list_comments_for_posts(&self, post_ids: &[Uuid]) -> Result<Vec<Comment>>;
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        Ok(user_repo::create_user(&self.pool, &user).await?)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(user_repo::find_user(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(user_repo::find_user_by_email(&self.pool, email).await?)
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        Ok(user_repo::find_users_by_ids(&self.pool, ids).await?)
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<Option<User>> {
        Ok(user_repo::update_profile(&self.pool, id, &changes).await?)
    }
}

#[async_trait]
impl PostRepository for PgStore {
    async fn insert_post(&self, post: NewPost) -> Result<Post> {
        Ok(post_repo::insert_post(&self.pool, &post).await?)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(post_repo::find_post(&self.pool, id).await?)
    }

    async fn update_post(
        &self,
        id: Uuid,
        owner_id: Uuid,
        changes: PostChanges,
    ) -> Result<Option<Post>> {
        Ok(post_repo::update_post(&self.pool, id, owner_id, &changes).await?)
    }

    async fn delete_post(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Post>> {
        Ok(post_repo::delete_post(&self.pool, id, owner_id).await?)
    }

    async fn list_posts(&self, offset: i64, limit: i64) -> Result<Vec<Post>> {
        Ok(post_repo::list_posts(&self.pool, offset, limit).await?)
    }

    async fn count_posts(&self) -> Result<i64> {
        Ok(post_repo::count_posts(&self.pool).await?)
    }

    async fn list_posts_by_owner(
        &self,
        owner_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>> {
        Ok(post_repo::list_posts_by_owner(&self.pool, owner_id, offset, limit).await?)
    }

    async fn count_posts_by_owner(&self, owner_id: Uuid) -> Result<i64> {
        Ok(post_repo::count_posts_by_owner(&self.pool, owner_id).await?)
    }

    async fn increment_views(&self, id: Uuid) -> Result<Option<i64>> {
        Ok(post_repo::increment_views(&self.pool, id).await?)
    }

    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<Vec<Uuid>>> {
        Ok(post_repo::toggle_like(&self.pool, id, user_id).await?)
    }
}

#[async_trait]
impl CommentRepository for PgStore {
    async fn append_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        text: &str,
    ) -> Result<Option<Comment>> {
        Ok(comment_repo::append_comment(&self.pool, post_id, author_id, text).await?)
    }

    async fn find_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<Option<Comment>> {
        Ok(comment_repo::find_comment(&self.pool, post_id, comment_id).await?)
    }

    async fn delete_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        author_id: Uuid,
    ) -> Result<bool> {
        Ok(comment_repo::delete_comment(&self.pool, post_id, comment_id, author_id).await?)
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        Ok(comment_repo::list_comments(&self.pool, post_id).await?)
    }

    async fn list_comments_for_posts(&self, post_ids: &[Uuid]) -> Result<Vec<Comment>> {
        Ok(comment_repo::list_comments_for_posts(&self.pool, post_ids).await?)
    }
}
