//! Calcast - a social media content calendar
//!
//! This library provides the core of Calcast: a file-backed store for posts,
//! accounts and assets, the post lifecycle operations the calendar is built on,
//! and the clients that generate posts with an AI model and publish them through
//! a social-posting API.

pub mod calendar;
pub mod config;
pub mod error;
pub mod generation;
pub mod logging;
pub mod publishing;
pub mod scheduling;
pub mod service;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{CalcastError, RemoteError, Result};
pub use store::{FileBackend, MemoryBackend, StorageBackend, Store};
pub use types::{Asset, BusinessProfile, Post, PostStats, PostStatus, SocialAccount, SocialPlatform};
