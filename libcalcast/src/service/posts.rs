//! Post lifecycle: create, edit, delete and query calendar posts
//!
//! Every mutation is a guarded read-modify-write of the whole posts collection
//! and is durable before the call returns.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use super::Mutation;
use crate::calendar::{self, MonthView};
use crate::store::Store;
use crate::types::{Post, PostStatus};
use crate::{CalcastError, Result};

/// Number of posts shown in the dashboard's recent list
const RECENT_POSTS: usize = 5;

/// Engagement totals over a set of posts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AggregateStats {
    pub total_likes: u64,
    pub total_shares: u64,
}

/// Sum likes and shares; posts without stats count as zero
pub fn aggregate_stats(posts: &[Post]) -> AggregateStats {
    posts
        .iter()
        .filter_map(|p| p.stats)
        .fold(AggregateStats::default(), |acc, stats| AggregateStats {
            total_likes: acc.total_likes.saturating_add(stats.likes),
            total_shares: acc.total_shares.saturating_add(stats.shares),
        })
}

/// Overview numbers for the whole calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub drafts: usize,
    pub scheduled: usize,
    pub published: usize,
    pub total_likes: u64,
    pub total_shares: u64,
    pub recent: Vec<Post>,
}

impl DashboardStats {
    pub fn from_posts(posts: &[Post]) -> Self {
        let count = |status: PostStatus| posts.iter().filter(|p| p.status == status).count();
        let totals = aggregate_stats(posts);
        Self {
            total: posts.len(),
            drafts: count(PostStatus::Draft),
            scheduled: count(PostStatus::Scheduled),
            published: count(PostStatus::Published),
            total_likes: totals.total_likes,
            total_shares: totals.total_shares,
            recent: posts.iter().take(RECENT_POSTS).cloned().collect(),
        }
    }
}

/// Post lifecycle manager
#[derive(Debug, Clone)]
pub struct PostService {
    store: Arc<Store>,
}

impl PostService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// The whole collection, in stored order
    pub fn all(&self) -> Result<Vec<Post>> {
        self.store.load_posts()
    }

    pub fn get(&self, id: &str) -> Result<Option<Post>> {
        Ok(self.store.load_posts()?.into_iter().find(|p| p.id == id))
    }

    /// Like [`get`](Self::get), but a missing post is an error
    pub fn require(&self, id: &str) -> Result<Post> {
        self.get(id)?
            .ok_or_else(|| CalcastError::NotFound(format!("post {}", id)))
    }

    /// Append `posts` to the calendar and return the new collection
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput`, and stores nothing, if any id is already taken
    /// or appears twice in `posts`.
    pub fn create_many(&self, posts: Vec<Post>) -> Result<Vec<Post>> {
        let incoming = posts.len();
        let (collection, _) = self.store.modify_posts(move |current| {
            let mut seen: HashSet<&str> = current.iter().map(|p| p.id.as_str()).collect();
            for post in &posts {
                if !seen.insert(post.id.as_str()) {
                    return Err(CalcastError::InvalidInput(format!(
                        "Duplicate post id: {}",
                        post.id
                    )));
                }
            }
            current.extend(posts);
            Ok(incoming > 0)
        })?;

        info!(added = incoming, total = collection.len(), "posts created");
        Ok(collection)
    }

    /// Replace the stored post that has `post.id`
    pub fn update(&self, post: Post) -> Result<Mutation<Post>> {
        let id = post.id.clone();
        let (collection, applied) = self.store.modify_posts(move |current| {
            match current.iter().position(|p| p.id == post.id) {
                Some(index) => {
                    current[index] = post;
                    Ok(true)
                }
                None => Ok(false),
            }
        })?;

        if applied {
            info!(post_id = %id, "post updated");
            Ok(Mutation::Applied(collection))
        } else {
            debug!(post_id = %id, "update target not found");
            Ok(Mutation::NotFound(collection))
        }
    }

    /// Remove the post with `id`
    pub fn delete(&self, id: &str) -> Result<Mutation<Post>> {
        let (collection, removed) = self.store.modify_posts(|current| {
            let before = current.len();
            current.retain(|p| p.id != id);
            Ok(current.len() != before)
        })?;

        if removed {
            info!(post_id = %id, "post deleted");
            Ok(Mutation::Applied(collection))
        } else {
            debug!(post_id = %id, "delete target not found");
            Ok(Mutation::NotFound(collection))
        }
    }

    /// Posts scheduled on `day`
    pub fn posts_on_day(&self, day: NaiveDate) -> Result<Vec<Post>> {
        Ok(calendar::posts_on_day(&self.store.load_posts()?, day))
    }

    /// Posts in `month`, grouped by day of month
    pub fn month(&self, month: MonthView) -> Result<BTreeMap<u32, Vec<Post>>> {
        Ok(month.posts_by_day(&self.store.load_posts()?))
    }

    pub fn with_status(&self, status: PostStatus) -> Result<Vec<Post>> {
        Ok(self
            .store
            .load_posts()?
            .into_iter()
            .filter(|p| p.status == status)
            .collect())
    }

    pub fn dashboard(&self) -> Result<DashboardStats> {
        Ok(DashboardStats::from_posts(&self.store.load_posts()?))
    }
}
