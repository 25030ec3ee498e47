//! Service layer for Calcast
//!
//! Business logic shared by the command-line tools, kept free of any
//! presentation concerns.
//!
//! # Architecture
//!
//! `CalcastService` is the facade. It owns the shared [`Store`] and hands out
//! the specialized sub-services:
//!
//! - `PostService`: post lifecycle (create, edit, delete, calendar queries)
//! - `PublishCoordinator`: publishing posts through the posting API
//! - `AccountService`: API key, connected accounts, business profile
//! - `AssetService`: the media asset library
//! - `GenerationService`: AI-generated campaign batches
//! - `EventBus`: activity notifications
//!
//! # Example
//!
//! ```no_run
//! use libcalcast::service::CalcastService;
//!
//! # async fn example() -> libcalcast::Result<()> {
//! let service = CalcastService::new()?;
//!
//! for post in service.posts().all()? {
//!     println!("{} {}", post.scheduled_date, post.content);
//! }
//!
//! let report = service.publisher().publish_by_id("gen-42").await?;
//! println!("published {}", report.post.id);
//! # Ok(())
//! # }
//! ```

pub mod accounts;
pub mod assets;
pub mod events;
pub mod generation;
pub mod posts;
pub mod publish;

use std::sync::Arc;

use self::accounts::AccountService;
use self::assets::AssetService;
use self::events::{EventBus, EventReceiver};
use self::generation::GenerationService;
use self::posts::PostService;
use self::publish::PublishCoordinator;
use crate::generation::gemini::GeminiClient;
use crate::generation::ContentGenerator;
use crate::publishing::ayrshare::AyrshareClient;
use crate::publishing::SocialPoster;
use crate::{CalcastError, Config, Result, Store};

/// Outcome of an edit addressed by id
///
/// Both variants carry the collection as it stands after the call. `NotFound`
/// means nothing was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation<T> {
    Applied(Vec<T>),
    NotFound(Vec<T>),
}

impl<T> Mutation<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Mutation::Applied(_))
    }

    pub fn snapshot(&self) -> &[T] {
        match self {
            Mutation::Applied(items) | Mutation::NotFound(items) => items,
        }
    }

    /// Turn `NotFound` into `CalcastError::NotFound` naming `what`
    pub fn into_result(self, what: &str) -> Result<Vec<T>> {
        match self {
            Mutation::Applied(items) => Ok(items),
            Mutation::NotFound(_) => Err(CalcastError::NotFound(what.to_string())),
        }
    }
}

/// Main service facade
///
/// All sub-services share one `Arc<Store>`, so their read-modify-write
/// operations are serialized by the store's write lock.
pub struct CalcastService {
    store: Arc<Store>,
    posts: PostService,
    publisher: PublishCoordinator,
    accounts: AccountService,
    assets: AssetService,
    generation: GenerationService,
    event_bus: EventBus,
}

impl CalcastService {
    /// Create a service from the configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or the data
    /// directory cannot be created.
    pub fn new() -> Result<Self> {
        Self::from_config(Config::load()?)
    }

    /// Create a service over the configured data directory and the real
    /// Gemini and Ayrshare clients
    pub fn from_config(config: Config) -> Result<Self> {
        let store = Store::open(config.store_dir())?;
        let generator = Arc::new(GeminiClient::new(&config.generation)?);
        let poster = Arc::new(AyrshareClient::new(&config.publishing)?);
        Ok(Self::with_parts(store, generator, poster, config))
    }

    /// Assemble a service from explicit collaborators
    ///
    /// Used by tests and dry runs to swap in `MemoryBackend`, `MockGenerator`
    /// or `MockPoster`.
    pub fn with_parts(
        store: Store,
        generator: Arc<dyn ContentGenerator>,
        poster: Arc<dyn SocialPoster>,
        config: Config,
    ) -> Self {
        let store = Arc::new(store);
        let event_bus = EventBus::new(100);

        let posts = PostService::new(Arc::clone(&store));
        let publisher = PublishCoordinator::new(
            Arc::clone(&store),
            posts.clone(),
            Arc::clone(&poster),
            event_bus.clone(),
        );
        let accounts = AccountService::new(Arc::clone(&store), poster, event_bus.clone());
        let assets = AssetService::new(Arc::clone(&store));
        let generation = GenerationService::new(
            posts.clone(),
            generator,
            config.generation,
            event_bus.clone(),
        )
        .with_platforms(config.defaults.platforms);

        Self {
            store,
            posts,
            publisher,
            accounts,
            assets,
            generation,
            event_bus,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn posts(&self) -> &PostService {
        &self.posts
    }

    pub fn publisher(&self) -> &PublishCoordinator {
        &self.publisher
    }

    pub fn accounts(&self) -> &AccountService {
        &self.accounts
    }

    pub fn assets(&self) -> &AssetService {
        &self.assets
    }

    pub fn generation(&self) -> &GenerationService {
        &self.generation
    }

    /// Subscribe to service events
    ///
    /// Each receiver sees the events emitted after it subscribed.
    pub fn subscribe(&self) -> EventReceiver {
        self.event_bus.subscribe()
    }
}

impl std::fmt::Debug for CalcastService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalcastService")
            .field("store", &self.store)
            .field("event_bus", &self.event_bus)
            .finish()
    }
}
