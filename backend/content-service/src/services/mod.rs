/// Business logic layer for content-service
///
/// - `auth_gate`: bearer-token identity resolution
/// - `accounts`: registration, login and profiles
/// - `posts`: post lifecycle around the media pipeline
/// - `engagement`: likes and comments
/// - `feed`: paginated reverse-chronological listings
/// - `populate`: joins posts and comments with author summaries
pub mod accounts;
pub mod auth_gate;
pub mod engagement;
pub mod feed;
pub mod populate;
pub mod posts;

pub use accounts::{AccountService, Registration, Session};
pub use auth_gate::{AuthGate, Identity};
pub use engagement::EngagementService;
pub use feed::FeedPaginator;
pub use populate::PostPopulator;
pub use posts::{ContentService, PostDraft};

use crate::config::{FeedConfig, MediaConfig};
use crate::db::{CommentRepository, PostRepository, UserRepository};
use crate::media::{MediaPipeline, ObjectStore, ThumbnailSpec};
use std::sync::Arc;
use std::time::Duration;

/// Every service, wired over one store
#[derive(Clone)]
pub struct ServiceRegistry {
    pub auth: Arc<AuthGate>,
    pub accounts: Arc<AccountService>,
    pub content: Arc<ContentService>,
    pub engagement: Arc<EngagementService>,
    pub feed: Arc<FeedPaginator>,
}

impl ServiceRegistry {
    pub fn new<S>(
        store: Arc<S>,
        object_store: Arc<dyn ObjectStore>,
        media_config: &MediaConfig,
        feed_config: FeedConfig,
    ) -> Self
    where
        S: UserRepository + PostRepository + CommentRepository + 'static,
    {
        let users: Arc<dyn UserRepository> = store.clone();
        let posts: Arc<dyn PostRepository> = store.clone();
        let comments: Arc<dyn CommentRepository> = store;

        let pipeline = Arc::new(MediaPipeline::new(
            object_store,
            ThumbnailSpec {
                width: media_config.thumbnail_width,
                height: media_config.thumbnail_height,
            },
            Duration::from_secs(media_config.upload_timeout_secs),
        ));
        let populator = PostPopulator::new(users.clone(), comments.clone());
        let gate = AuthGate::new(users.clone());

        Self {
            auth: Arc::new(gate.clone()),
            accounts: Arc::new(AccountService::new(
                users,
                gate,
                pipeline.clone(),
                media_config.avatar_constraints(),
            )),
            content: Arc::new(ContentService::new(
                posts.clone(),
                pipeline,
                populator.clone(),
                media_config.post_constraints(),
            )),
            engagement: Arc::new(EngagementService::new(
                posts.clone(),
                comments,
                populator.clone(),
            )),
            feed: Arc::new(FeedPaginator::new(posts, populator, feed_config)),
        }
    }
}
