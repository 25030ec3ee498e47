//! Campaign generation: ask the model for a batch and add it to the calendar

use std::sync::Arc;

use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use super::events::{Event, EventBus};
use super::posts::PostService;
use crate::config::GenerationConfig;
use crate::generation::{plan_posts, ContentGenerator, GenerationRequest};
use crate::types::{Post, SocialPlatform};
use crate::{CalcastError, RemoteError, Result};

#[derive(Clone)]
pub struct GenerationService {
    posts: PostService,
    generator: Arc<dyn ContentGenerator>,
    config: GenerationConfig,
    platforms: Vec<SocialPlatform>,
    event_bus: EventBus,
}

impl GenerationService {
    pub fn new(
        posts: PostService,
        generator: Arc<dyn ContentGenerator>,
        config: GenerationConfig,
        event_bus: EventBus,
    ) -> Self {
        Self {
            posts,
            generator,
            config,
            platforms: SocialPlatform::GENERATED_DEFAULT.to_vec(),
            event_bus,
        }
    }

    /// Assign `platforms` to generated drafts instead of the default set
    ///
    /// An empty list keeps the default set.
    pub fn with_platforms(mut self, platforms: Vec<SocialPlatform>) -> Self {
        if !platforms.is_empty() {
            self.platforms = platforms;
        }
        self
    }

    /// Build a request for the configured batch size
    pub fn request(
        &self,
        business_name: &str,
        description: &str,
        website: Option<&str>,
        start_date: NaiveDate,
    ) -> GenerationRequest {
        GenerationRequest {
            business_name: business_name.trim().to_string(),
            description: description.trim().to_string(),
            website: website.map(str::trim).filter(|w| !w.is_empty()).map(str::to_string),
            start_date,
            post_count: self.config.post_count,
        }
    }

    /// Read the model API key from the configured environment variable
    pub fn credential(&self) -> Result<SecretString> {
        let name = &self.config.api_key_env;
        std::env::var(name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(SecretString::from)
            .ok_or_else(|| {
                RemoteError::MissingCredential(format!("environment variable {} is not set", name))
                    .into()
            })
    }

    /// Generate drafts for `request` without saving them
    pub async fn preview(&self, request: &GenerationRequest) -> Result<Vec<Post>> {
        if request.business_name.is_empty() {
            return Err(CalcastError::InvalidInput("Business name is required".to_string()));
        }
        if request.description.is_empty() {
            return Err(CalcastError::InvalidInput(
                "Business description is required".to_string(),
            ));
        }

        let credential = self.credential()?;
        debug!(
            generator = self.generator.name(),
            count = request.post_count,
            "requesting candidates"
        );
        let candidates = self
            .generator
            .generate(request, credential.expose_secret())
            .await?;
        let mut drafts = plan_posts(request, candidates)?;
        for draft in &mut drafts {
            draft.platforms = self.platforms.clone();
        }
        Ok(drafts)
    }

    /// Generate drafts for `request` and append them to the calendar
    ///
    /// Returns the new drafts. Any failure discards the whole batch.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Post>> {
        let drafts = self.preview(request).await?;
        self.posts.create_many(drafts.clone())?;

        info!(count = drafts.len(), business = %request.business_name, "generated batch saved");
        self.event_bus.emit(Event::GenerationCompleted { count: drafts.len() });
        Ok(drafts)
    }
}

impl std::fmt::Debug for GenerationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationService")
            .field("generator", &self.generator.name())
            .field("post_count", &self.config.post_count)
            .finish()
    }
}
