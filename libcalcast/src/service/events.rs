//! Event bus for calendar activity
//!
//! Services announce generation batches, publish attempts and profile syncs on
//! an in-process `tokio::sync::broadcast` channel. Emitting never blocks and is
//! a no-op when nobody subscribed; lagging subscribers lose the oldest events.
//!
//! # Example
//!
//! ```
//! use libcalcast::service::events::{Event, EventBus};
//!
//! # async fn example() {
//! let event_bus = EventBus::new(100);
//! let mut receiver = event_bus.subscribe();
//!
//! event_bus.emit(Event::PublishStarted {
//!     post_id: "gen-1".to_string(),
//!     platforms: vec!["facebook".to_string()],
//! });
//!
//! if let Ok(event) = receiver.recv().await {
//!     println!("Received: {:?}", event);
//! }
//! # }
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

pub type EventReceiver = broadcast::Receiver<Event>;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: Event) {
        // send() only fails when there are no receivers
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A generated batch was added to the calendar
    GenerationCompleted {
        count: usize,
    },

    /// A publish attempt was handed to the posting service
    PublishStarted {
        post_id: String,
        /// Platform codes as sent to the service
        platforms: Vec<String>,
    },

    PublishCompleted {
        post_id: String,
        remote_id: Option<String>,
    },

    /// The attempt failed; the post keeps its previous status
    PublishFailed {
        post_id: String,
        error: String,
    },

    AccountsSynced {
        connected: Vec<String>,
    },
}
