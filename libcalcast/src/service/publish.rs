//! Publishing posts through the posting service
//!
//! A publish attempt needs a stored API key. On success the post is marked
//! `published` and written back through [`PostService::update`]; on failure the
//! stored post is left exactly as it was. Nothing is retried.

use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing::{debug, info, warn};

use super::events::{Event, EventBus};
use super::posts::PostService;
use crate::publishing::{PublishReceipt, SocialPoster};
use crate::store::Store;
use crate::types::{Post, PostStatus};
use crate::{CalcastError, RemoteError, Result};

/// Result of a successful publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    /// The post as published, status `published`
    pub post: Post,
    pub receipt: PublishReceipt,
    /// False when the post vanished from the store while the request was in flight
    pub persisted: bool,
}

/// What `save_and_sync` did after saving
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Saved locally; the post is a draft or no API key is stored
    LocalOnly,
    Published(PublishReport),
    /// Saved locally but the posting service refused or could not be reached
    Failed(RemoteError),
}

#[derive(Clone)]
pub struct PublishCoordinator {
    store: Arc<Store>,
    posts: PostService,
    poster: Arc<dyn SocialPoster>,
    event_bus: EventBus,
}

impl PublishCoordinator {
    pub fn new(
        store: Arc<Store>,
        posts: PostService,
        poster: Arc<dyn SocialPoster>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            store,
            posts,
            poster,
            event_bus,
        }
    }

    /// Publish `post` now
    ///
    /// # Errors
    ///
    /// - `RemoteError::MissingCredential` if no API key is stored; no request is made
    /// - any `RemoteError` from the posting service; the stored post is unchanged
    pub async fn publish(&self, post: &Post) -> Result<PublishReport> {
        let key = self.store.load_api_key()?.ok_or_else(|| {
            RemoteError::MissingCredential(
                "Ayrshare API key is not set (run `cal-setup key set`)".to_string(),
            )
        })?;

        let platforms: Vec<String> = post
            .platforms
            .iter()
            .map(|p| p.api_code().to_string())
            .collect();
        debug!(post_id = %post.id, poster = self.poster.name(), ?platforms, "publishing post");
        self.event_bus.emit(Event::PublishStarted {
            post_id: post.id.clone(),
            platforms,
        });

        let receipt = match self.poster.publish(key.expose_secret(), post).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(post_id = %post.id, error = %e, "publish failed");
                self.event_bus.emit(Event::PublishFailed {
                    post_id: post.id.clone(),
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        let published = post.clone().with_status(PostStatus::Published);
        let persisted = self.posts.update(published.clone())?.is_applied();
        if persisted {
            info!(post_id = %post.id, remote_id = ?receipt.remote_id, "post published");
        } else {
            warn!(
                post_id = %post.id,
                "post published remotely but no longer exists locally"
            );
        }

        self.event_bus.emit(Event::PublishCompleted {
            post_id: post.id.clone(),
            remote_id: receipt.remote_id.clone(),
        });

        Ok(PublishReport {
            post: published,
            receipt,
            persisted,
        })
    }

    /// Load the post with `id` and publish it
    pub async fn publish_by_id(&self, id: &str) -> Result<PublishReport> {
        let post = self.posts.require(id)?;
        self.publish(&post).await
    }

    /// Save an edited post, then publish it if it is not a draft and an API
    /// key is stored
    ///
    /// The local edit is kept whatever the posting service answers.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no stored post has `post.id`, and store errors.
    /// Remote failures are reported as [`SyncOutcome::Failed`].
    pub async fn save_and_sync(&self, post: Post) -> Result<SyncOutcome> {
        self.posts
            .update(post.clone())?
            .into_result(&format!("post {}", post.id))?;

        if post.status == PostStatus::Draft {
            return Ok(SyncOutcome::LocalOnly);
        }
        if self.store.load_api_key()?.is_none() {
            debug!(post_id = %post.id, "no API key stored, keeping edit local");
            return Ok(SyncOutcome::LocalOnly);
        }

        match self.publish(&post).await {
            Ok(report) => Ok(SyncOutcome::Published(report)),
            Err(CalcastError::Remote(e)) => Ok(SyncOutcome::Failed(e)),
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for PublishCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishCoordinator")
            .field("poster", &self.poster.name())
            .finish()
    }
}
