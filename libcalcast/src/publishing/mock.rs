//! Mock posting service for testing
//!
//! Simulates the posting API without network access: publishes succeed or fail
//! as configured, and every attempt is recorded for verification. Available in
//! all builds so integration tests and dry runs can use it.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use super::{PublishReceipt, SocialPoster};
use crate::error::{RemoteError, Result};
use crate::types::Post;

/// Configuration for mock posting behavior
#[derive(Debug, Clone)]
pub struct MockPosterConfig {
    /// Error returned by `publish`, `None` to succeed
    pub publish_error: Option<RemoteError>,

    /// Error returned by `connected_platforms`, `None` to succeed
    pub profile_error: Option<RemoteError>,

    /// Codes reported by `connected_platforms`
    pub connected: Vec<String>,

    /// Delay before answering (simulates network latency)
    pub delay: Duration,

    /// Number of times publish has been called
    pub publish_call_count: Arc<Mutex<usize>>,

    /// Number of times connected_platforms has been called
    pub profile_call_count: Arc<Mutex<usize>>,

    /// Ids of posts that were published successfully
    pub published_ids: Arc<Mutex<Vec<String>>>,
}

impl Default for MockPosterConfig {
    fn default() -> Self {
        Self {
            publish_error: None,
            profile_error: None,
            connected: Vec::new(),
            delay: Duration::from_millis(0),
            publish_call_count: Arc::new(Mutex::new(0)),
            profile_call_count: Arc::new(Mutex::new(0)),
            published_ids: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Mock posting service
#[derive(Debug, Clone, Default)]
pub struct MockPoster {
    config: MockPosterConfig,
}

impl MockPoster {
    pub fn new(config: MockPosterConfig) -> Self {
        Self { config }
    }

    /// A poster that accepts everything
    pub fn success() -> Self {
        Self::default()
    }

    /// A poster whose publishes fail with `error`
    pub fn publish_failure(error: RemoteError) -> Self {
        Self::new(MockPosterConfig {
            publish_error: Some(error),
            ..Default::default()
        })
    }

    /// A poster reporting `codes` as connected
    pub fn with_connected(codes: &[&str]) -> Self {
        Self::new(MockPosterConfig {
            connected: codes.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        })
    }

    pub fn publish_call_count(&self) -> usize {
        self.config.publish_call_count.lock().map(|c| *c).unwrap_or(0)
    }

    pub fn profile_call_count(&self) -> usize {
        self.config.profile_call_count.lock().map(|c| *c).unwrap_or(0)
    }

    pub fn published_ids(&self) -> Vec<String> {
        self.config
            .published_ids
            .lock()
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }

    fn bump(counter: &Arc<Mutex<usize>>) {
        if let Ok(mut count) = counter.lock() {
            *count += 1;
        }
    }
}

#[async_trait]
impl SocialPoster for MockPoster {
    async fn publish(&self, credential: &str, post: &Post) -> Result<PublishReceipt> {
        if credential.trim().is_empty() {
            return Err(RemoteError::MissingCredential("mock poster key".to_string()).into());
        }
        Self::bump(&self.config.publish_call_count);

        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }

        if let Some(error) = &self.config.publish_error {
            return Err(error.clone().into());
        }

        if let Ok(mut ids) = self.config.published_ids.lock() {
            ids.push(post.id.clone());
        }

        Ok(PublishReceipt {
            status: Some("success".to_string()),
            remote_id: Some(format!("mock-{}", post.id)),
        })
    }

    async fn connected_platforms(&self, credential: &str) -> Result<Vec<String>> {
        if credential.trim().is_empty() {
            return Err(RemoteError::MissingCredential("mock poster key".to_string()).into());
        }
        Self::bump(&self.config.profile_call_count);

        if let Some(error) = &self.config.profile_error {
            return Err(error.clone().into());
        }
        Ok(self.config.connected.clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
