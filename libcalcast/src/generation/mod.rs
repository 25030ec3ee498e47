//! AI post generation
//!
//! A [`ContentGenerator`] turns a business description into candidate posts;
//! [`plan_posts`] turns those candidates into calendar drafts. Candidates carry
//! only text, an image prompt, and a day offset from the campaign start.
//!
//! # Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use libcalcast::generation::{gemini::GeminiClient, plan_posts, ContentGenerator, GenerationRequest};
//! use libcalcast::config::GenerationConfig;
//!
//! # async fn example() -> libcalcast::Result<()> {
//! let client = GeminiClient::new(&GenerationConfig::default())?;
//! let request = GenerationRequest {
//!     business_name: "Corner Bakery".to_string(),
//!     description: "Sourdough and pastries".to_string(),
//!     website: None,
//!     start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
//!     post_count: 15,
//! };
//! let candidates = client.generate(&request, "gemini-key").await?;
//! let posts = plan_posts(&request, candidates)?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{RemoteError, Result};
use crate::types::{Post, PostStats, PostStatus, SocialPlatform};

pub mod gemini;
pub mod mock;

/// What to generate a campaign for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub business_name: String,
    pub description: String,
    pub website: Option<String>,
    pub start_date: NaiveDate,
    pub post_count: u32,
}

/// One post as proposed by the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePost {
    pub content: String,
    pub image_prompt: String,
    pub day_offset: i64,
}

/// Source of candidate posts
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Produce candidates for `request`
    ///
    /// # Errors
    ///
    /// - `RemoteError::MissingCredential` if `credential` is empty
    /// - `RemoteError::Transport` if the service cannot be reached
    /// - `RemoteError::Rejected` if the service answers with an error
    /// - `RemoteError::MalformedResponse` if the answer does not parse as candidates
    async fn generate(
        &self,
        request: &GenerationRequest,
        credential: &str,
    ) -> Result<Vec<CandidatePost>>;

    /// Short name for log output
    fn name(&self) -> &str;
}

/// Prompt sent to the model
pub fn build_prompt(request: &GenerationRequest) -> String {
    let website = request
        .website
        .as_deref()
        .filter(|w| !w.is_empty())
        .map(|w| format!("\nWebsite: \"{}\".", w))
        .unwrap_or_default();

    format!(
        "You are an expert social media manager.\n\
         Generate a content calendar for a business named \"{name}\".\n\
         Business Description: \"{description}\".{website}\n\n\
         Task: Create {count} distinct, engaging social media posts starting from {start}.\n\
         The posts should vary in type (educational, promotional, engaging, funny, quote).\n\n\
         For each post, provide:\n\
         1. The text content (engaging, with emojis).\n\
         2. A suggested image description (visual prompt).\n\
         3. A recommended day offset from the start date (0 to 29).",
        name = request.business_name,
        description = request.description,
        website = website,
        count = request.post_count,
        start = request.start_date.format("%a %b %d %Y"),
    )
}

/// Placeholder image for a generated post
pub fn placeholder_image(seed: u32) -> String {
    format!("https://picsum.photos/seed/{}/800/800", seed)
}

/// Turn candidates into drafts on the calendar
///
/// Each draft is scheduled at midnight on `start_date + day_offset`, gets a
/// `gen-` id, a placeholder image, the default platform set, and zeroed stats.
/// A candidate whose date overflows the calendar fails the whole batch.
pub fn plan_posts(request: &GenerationRequest, candidates: Vec<CandidatePost>) -> Result<Vec<Post>> {
    let mut rng = rand::thread_rng();
    let start = request
        .start_date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| RemoteError::MalformedResponse("invalid start date".to_string()))?;

    candidates
        .into_iter()
        .map(|candidate| -> Result<Post> {
            let scheduled_date = Duration::try_days(candidate.day_offset)
                .and_then(|offset| start.checked_add_signed(offset))
                .ok_or_else(|| {
                    RemoteError::MalformedResponse(format!(
                        "day offset {} is out of range",
                        candidate.day_offset
                    ))
                })?;

            Ok(Post {
                id: format!("gen-{}", uuid::Uuid::new_v4()),
                content: candidate.content,
                image: Some(placeholder_image(rng.gen_range(0..1000))),
                platforms: SocialPlatform::GENERATED_DEFAULT.to_vec(),
                scheduled_date,
                status: PostStatus::Draft,
                stats: Some(PostStats::default()),
            })
        })
        .collect()
}
