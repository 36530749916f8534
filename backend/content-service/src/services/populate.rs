/// Populate step: joins stored posts and comments with their authors
///
/// Lookups are batched per call, one query for users and one for comments,
/// regardless of how many posts are populated.
use crate::db::{CommentRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::models::{AuthorSummary, Comment, CommentView, Post, PostView, User};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct PostPopulator {
    users: Arc<dyn UserRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl PostPopulator {
    pub fn new(users: Arc<dyn UserRepository>, comments: Arc<dyn CommentRepository>) -> Self {
        Self { users, comments }
    }

    pub async fn populate_one(&self, post: Post) -> Result<PostView> {
        let id = post.id;
        self.populate_many(vec![post])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal(format!("populate dropped post {}", id)))
    }

    /// Order of `posts` is preserved
    pub async fn populate_many(&self, posts: Vec<Post>) -> Result<Vec<PostView>> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        let comments = self.comments.list_comments_for_posts(&post_ids).await?;

        let author_ids = posts
            .iter()
            .map(|p| p.owner_id)
            .chain(comments.iter().map(|c| c.author_id));
        let authors = self.authors(author_ids).await?;

        let mut by_post: HashMap<Uuid, Vec<CommentView>> = HashMap::new();
        for comment in comments {
            let view = comment_view(comment.clone(), &authors);
            by_post.entry(comment.post_id).or_default().push(view);
        }

        Ok(posts
            .into_iter()
            .map(|post| {
                let comments = by_post.remove(&post.id).unwrap_or_default();
                post_view(post, comments, &authors)
            })
            .collect())
    }

    /// Views for comments already loaded newest first
    pub async fn comment_views(&self, comments: Vec<Comment>) -> Result<Vec<CommentView>> {
        let authors = self.authors(comments.iter().map(|c| c.author_id)).await?;
        Ok(comments
            .into_iter()
            .map(|c| comment_view(c, &authors))
            .collect())
    }

    async fn authors(
        &self,
        ids: impl Iterator<Item = Uuid>,
    ) -> Result<HashMap<Uuid, AuthorSummary>> {
        let mut ids: Vec<Uuid> = ids.collect();
        ids.sort();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users: Vec<User> = self.users.find_users_by_ids(&ids).await?;
        Ok(users
            .iter()
            .map(|u| (u.id, AuthorSummary::from(u)))
            .collect())
    }
}

fn author(id: Uuid, authors: &HashMap<Uuid, AuthorSummary>) -> AuthorSummary {
    authors
        .get(&id)
        .cloned()
        .unwrap_or_else(|| AuthorSummary::unknown(id))
}

fn comment_view(comment: Comment, authors: &HashMap<Uuid, AuthorSummary>) -> CommentView {
    CommentView {
        id: comment.id,
        author: author(comment.author_id, authors),
        text: comment.text,
        created_at: comment.created_at,
    }
}

fn post_view(
    post: Post,
    comments: Vec<CommentView>,
    authors: &HashMap<Uuid, AuthorSummary>,
) -> PostView {
    PostView {
        id: post.id,
        owner: author(post.owner_id, authors),
        media_url: post.media_url,
        thumbnail_url: post.thumbnail_url,
        title: post.title,
        description: post.description,
        hashtags: post.hashtags,
        likes: post.likes,
        comments,
        views: post.views,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, PostRepository};
    use crate::media::MediaRef;
    use crate::models::{NewPost, NewUser};

    async fn user(store: &MemoryStore, name: &str) -> User {
        store
            .create_user(NewUser {
                name: name.into(),
                email: format!("{}@example.com", name.to_lowercase()),
                password_hash: "hash".into(),
                bio: None,
                avatar: None,
            })
            .await
            .unwrap()
    }

    async fn post(store: &MemoryStore, owner: Uuid, title: &str) -> Post {
        store
            .insert_post(NewPost {
                owner_id: owner,
                media: MediaRef {
                    url: format!("https://cdn.test/{title}.png"),
                    key: format!("posts/{title}.png"),
                    thumbnail_url: None,
                    thumbnail_key: None,
                },
                title: title.into(),
                description: None,
                hashtags: Vec::new(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_populates_owner_and_comment_authors() {
        let store = Arc::new(MemoryStore::new());
        let ana = user(&store, "Ana").await;
        let ben = user(&store, "Ben").await;
        let first = post(&store, ana.id, "first").await;
        let second = post(&store, ben.id, "second").await;
        store.append_comment(first.id, ben.id, "nice").await.unwrap();
        store.append_comment(first.id, ana.id, "thanks").await.unwrap();

        let populator = PostPopulator::new(store.clone(), store.clone());
        let views = populator
            .populate_many(vec![second.clone(), first.clone()])
            .await
            .unwrap();

        assert_eq!(views[0].id, second.id);
        assert_eq!(views[0].owner.name, "Ben");
        assert!(views[0].comments.is_empty());

        assert_eq!(views[1].owner.name, "Ana");
        let comments: Vec<(&str, &str)> = views[1]
            .comments
            .iter()
            .map(|c| (c.text.as_str(), c.author.name.as_str()))
            .collect();
        assert_eq!(comments, [("thanks", "Ana"), ("nice", "Ben")]);
    }

    #[tokio::test]
    async fn test_missing_author_becomes_unknown() {
        let store = Arc::new(MemoryStore::new());
        let ghost = Uuid::new_v4();
        let p = post(&store, ghost, "orphan").await;

        let view = PostPopulator::new(store.clone(), store.clone())
            .populate_one(p)
            .await
            .unwrap();
        assert_eq!(view.owner, AuthorSummary::unknown(ghost));
    }
}
