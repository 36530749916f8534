/// Reverse-chronological feed pages
use crate::config::FeedConfig;
use crate::db::PostRepository;
use crate::error::Result;
use crate::models::{Page, Post, PostView};
use crate::services::populate::PostPopulator;
use std::sync::Arc;
use uuid::Uuid;

/// Normalised paging window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

pub struct FeedPaginator {
    posts: Arc<dyn PostRepository>,
    populator: PostPopulator,
    config: FeedConfig,
}

impl FeedPaginator {
    pub fn new(posts: Arc<dyn PostRepository>, populator: PostPopulator, config: FeedConfig) -> Self {
        Self {
            posts,
            populator,
            config,
        }
    }

    /// Missing values take the defaults; `page < 1` becomes 1 and `limit`
    /// is clamped to `1..=max_page_size`.
    pub fn normalize(&self, page: Option<i64>, limit: Option<i64>) -> PageRequest {
        PageRequest {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(self.config.default_page_size)
                .clamp(1, self.config.max_page_size),
        }
    }

    /// All posts, newest first
    pub async fn list(&self, page: Option<i64>, limit: Option<i64>) -> Result<Page<PostView>> {
        let req = self.normalize(page, limit);
        let total = self.posts.count_posts().await?;
        let posts = if req.offset() < total {
            self.posts.list_posts(req.offset(), req.limit).await?
        } else {
            Vec::new()
        };
        self.page(posts, total, req).await
    }

    /// Posts of one owner, newest first
    pub async fn list_by_owner(
        &self,
        owner_id: Uuid,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Page<PostView>> {
        let req = self.normalize(page, limit);
        let total = self.posts.count_posts_by_owner(owner_id).await?;
        let posts = if req.offset() < total {
            self.posts
                .list_posts_by_owner(owner_id, req.offset(), req.limit)
                .await?
        } else {
            Vec::new()
        };
        self.page(posts, total, req).await
    }

    async fn page(
        &self,
        posts: Vec<Post>,
        total: i64,
        req: PageRequest,
    ) -> Result<Page<PostView>> {
        Ok(Page {
            items: self.populator.populate_many(posts).await?,
            total,
            pages: page_count(total, req.limit),
            current_page: req.page,
        })
    }
}

fn page_count(total: i64, limit: i64) -> i64 {
    if total <= 0 {
        0
    } else {
        (total + limit - 1) / limit
    }
}
