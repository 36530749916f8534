//! In-process store implementing the repository traits.
//!
//! Each post and its comments live in one map entry; every mutation runs while
//! holding that entry's shard lock, so like toggles and comment appends are as
//! atomic here as the single-statement SQL in `PgStore`.

use super::{CommentRepository, PostRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::models::{Comment, NewPost, NewUser, Post, PostChanges, ProfileChanges, User};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::cmp::Reverse;
use uuid::Uuid;

struct StoredPost {
    post: Post,
    /// Newest first
    comments: Vec<Comment>,
}

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, User>,
    emails: DashMap<String, Uuid>,
    posts: DashMap<Uuid, StoredPost>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted_posts(&self, owner: Option<Uuid>) -> Vec<Post> {
        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|entry| owner.map_or(true, |o| entry.post.owner_id == o))
            .map(|entry| entry.post.clone())
            .collect();
        posts.sort_by_key(|p| Reverse((p.created_at, p.id)));
        posts
    }
}

fn page(posts: Vec<Post>, offset: i64, limit: i64) -> Vec<Post> {
    posts
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let email = user.email.to_lowercase();
        let id = Uuid::new_v4();

        match self.emails.entry(email.clone()) {
            Entry::Occupied(_) => {
                return Err(AppError::Conflict("Resource already exists".to_string()))
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        let stored = User {
            id,
            name: user.name,
            email,
            password_hash: user.password_hash,
            avatar_url: user.avatar.as_ref().map(|a| a.url.clone()),
            avatar_key: user.avatar.map(|a| a.key),
            bio: user.bio,
            created_at: Utc::now(),
        };
        self.users.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let id = self.emails.get(&email.to_lowercase()).map(|id| *id);
        Ok(id.and_then(|id| self.users.get(&id).map(|u| u.value().clone())))
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|u| u.value().clone()))
            .collect())
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<Option<User>> {
        Ok(self.users.get_mut(&id).map(|mut user| {
            if let Some(name) = changes.name {
                user.name = name;
            }
            if let Some(bio) = changes.bio {
                user.bio = Some(bio);
            }
            if let Some(avatar) = changes.avatar {
                user.avatar_url = Some(avatar.url);
                user.avatar_key = Some(avatar.key);
            }
            user.value().clone()
        }))
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn insert_post(&self, post: NewPost) -> Result<Post> {
        let now = Utc::now();
        let stored = Post {
            id: Uuid::new_v4(),
            owner_id: post.owner_id,
            media_url: post.media.url,
            media_key: post.media.key,
            thumbnail_url: post.media.thumbnail_url,
            thumbnail_key: post.media.thumbnail_key,
            title: post.title,
            description: post.description,
            hashtags: post.hashtags,
            likes: Vec::new(),
            views: 0,
            created_at: now,
            updated_at: now,
        };
        self.posts.insert(
            stored.id,
            StoredPost {
                post: stored.clone(),
                comments: Vec::new(),
            },
        );
        Ok(stored)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(self.posts.get(&id).map(|entry| entry.post.clone()))
    }

    async fn update_post(
        &self,
        id: Uuid,
        owner_id: Uuid,
        changes: PostChanges,
    ) -> Result<Option<Post>> {
        let Some(mut entry) = self.posts.get_mut(&id) else {
            return Ok(None);
        };
        if entry.post.owner_id != owner_id {
            return Ok(None);
        }

        let post = &mut entry.post;
        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(description) = changes.description {
            post.description = Some(description);
        }
        if let Some(hashtags) = changes.hashtags {
            post.hashtags = hashtags;
        }
        if let Some(media) = changes.media {
            post.media_url = media.url;
            post.media_key = media.key;
            post.thumbnail_url = media.thumbnail_url;
            post.thumbnail_key = media.thumbnail_key;
        }
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Post>> {
        Ok(self
            .posts
            .remove_if(&id, |_, stored| stored.post.owner_id == owner_id)
            .map(|(_, stored)| stored.post))
    }

    async fn list_posts(&self, offset: i64, limit: i64) -> Result<Vec<Post>> {
        Ok(page(self.sorted_posts(None), offset, limit))
    }

    async fn count_posts(&self) -> Result<i64> {
        Ok(self.posts.len() as i64)
    }

    async fn list_posts_by_owner(
        &self,
        owner_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>> {
        Ok(page(self.sorted_posts(Some(owner_id)), offset, limit))
    }

    async fn count_posts_by_owner(&self, owner_id: Uuid) -> Result<i64> {
        Ok(self
            .posts
            .iter()
            .filter(|entry| entry.post.owner_id == owner_id)
            .count() as i64)
    }

    async fn increment_views(&self, id: Uuid) -> Result<Option<i64>> {
        Ok(self.posts.get_mut(&id).map(|mut entry| {
            entry.post.views += 1;
            entry.post.views
        }))
    }

    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<Vec<Uuid>>> {
        Ok(self.posts.get_mut(&id).map(|mut entry| {
            let likes = &mut entry.post.likes;
            if let Some(pos) = likes.iter().position(|u| *u == user_id) {
                likes.remove(pos);
            } else {
                likes.push(user_id);
            }
            likes.clone()
        }))
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn append_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        text: &str,
    ) -> Result<Option<Comment>> {
        Ok(self.posts.get_mut(&post_id).map(|mut entry| {
            let comment = Comment {
                id: Uuid::new_v4(),
                post_id,
                author_id,
                text: text.to_string(),
                created_at: Utc::now(),
            };
            entry.comments.insert(0, comment.clone());
            comment
        }))
    }

    async fn find_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<Option<Comment>> {
        Ok(self.posts.get(&post_id).and_then(|entry| {
            entry
                .comments
                .iter()
                .find(|c| c.id == comment_id)
                .cloned()
        }))
    }

    async fn delete_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        author_id: Uuid,
    ) -> Result<bool> {
        Ok(self
            .posts
            .get_mut(&post_id)
            .map(|mut entry| {
                let before = entry.comments.len();
                entry
                    .comments
                    .retain(|c| !(c.id == comment_id && c.author_id == author_id));
                entry.comments.len() < before
            })
            .unwrap_or(false))
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        Ok(self
            .posts
            .get(&post_id)
            .map(|entry| entry.comments.clone())
            .unwrap_or_default())
    }

    async fn list_comments_for_posts(&self, post_ids: &[Uuid]) -> Result<Vec<Comment>> {
        Ok(post_ids
            .iter()
            .filter_map(|id| self.posts.get(id).map(|entry| entry.comments.clone()))
            .flatten()
            .collect())
    }
}
