//! Persistent store for Calcast collections
//!
//! The store keeps each collection (posts, accounts, business profile, API key,
//! assets) as one JSON document under a named key. Every write replaces the
//! whole document; there are no partial updates and no cross-collection
//! transactions.
//!
//! # Architecture
//!
//! - `StorageBackend` trait: raw get/set of strings by key
//! - `FileBackend`: one `<key>.json` file per collection in a data directory
//! - `MemoryBackend`: in-process map, used by tests and dry runs
//! - `Store`: typed load/save per collection on top of any backend
//!
//! Read-modify-write cycles go through [`Store::modify_posts`] and friends, which
//! hold the store's write lock for the whole cycle so two mutations in one
//! process cannot lose each other's update.
//!
//! # Example
//!
//! ```
//! use libcalcast::store::Store;
//!
//! # fn example() -> libcalcast::Result<()> {
//! let store = Store::in_memory();
//! assert!(store.load_posts()?.is_empty());
//! assert_eq!(store.load_accounts()?.len(), 5);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::types::{Asset, BusinessProfile, Post, SocialAccount};

/// Names of the persisted entries
pub mod keys {
    pub const POSTS: &str = "posts";
    pub const ACCOUNTS: &str = "accounts";
    pub const PROFILE: &str = "profile";
    pub const API_KEY: &str = "api_key";
    pub const ASSETS: &str = "assets";
}

/// Raw key-value medium behind a [`Store`]
pub trait StorageBackend: Send + Sync {
    /// Read the raw value for `key`, `None` when nothing was stored
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value for `key`
    ///
    /// Readers must observe either the old or the new value, never a mix.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// Short name for log output
    fn backend_name(&self) -> &str;
}

/// In-memory backend
///
/// Clones share the same map, so a test can keep a handle and inspect or
/// tamper with what the store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

/// File backend: `<dir>/<key>.json`
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// crash mid-write leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open (and create if needed) a data directory
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn io_error(key: &str, source: std::io::Error) -> StoreError {
        StoreError::Io {
            key: key.to_string(),
            source,
        }
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(key, e).into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let target = self.path_for(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        std::fs::write(&tmp, value).map_err(|e| Self::io_error(key, e))?;
        std::fs::rename(&tmp, &target).map_err(|e| Self::io_error(key, e))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error(key, e).into()),
        }
    }

    fn backend_name(&self) -> &str {
        "file"
    }
}

/// Typed access to the persisted collections
pub struct Store {
    backend: Box<dyn StorageBackend>,
    write_lock: Mutex<()>,
}

impl Store {
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            write_lock: Mutex::new(()),
        }
    }

    /// A store over a fresh in-memory backend
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// A store over a data directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(FileBackend::new(dir)?))
    }

    pub fn backend_name(&self) -> &str {
        self.backend.backend_name()
    }

    fn load_entry<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.backend.get(key)? else {
            return Ok(None);
        };
        let value = serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            key: key.to_string(),
            source,
        })?;
        Ok(Some(value))
    }

    fn save_entry<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        debug!(key, backend = self.backend.backend_name(), bytes = raw.len(), "saving entry");
        self.backend.set(key, &raw)
    }

    /// Load, mutate and save one collection under the write lock
    ///
    /// `apply` returns whether it changed the collection; unchanged collections
    /// are not written back. An error from `apply` aborts without writing.
    fn modify_entry<T, F>(&self, key: &str, default: impl FnOnce() -> T, apply: F) -> Result<(T, bool)>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> Result<bool>,
    {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut value = self.load_entry(key)?.unwrap_or_else(default);
        let changed = apply(&mut value)?;
        if changed {
            self.save_entry(key, &value)?;
        }
        Ok((value, changed))
    }

    // ------------------------------------------------------------------
    // Posts
    // ------------------------------------------------------------------

    pub fn load_posts(&self) -> Result<Vec<Post>> {
        Ok(self.load_entry(keys::POSTS)?.unwrap_or_default())
    }

    pub fn save_posts(&self, posts: &[Post]) -> Result<()> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        self.save_entry(keys::POSTS, posts)
    }

    /// Guarded read-modify-write of the posts collection
    ///
    /// Returns the collection as it stands after the call and whether it changed.
    pub fn modify_posts<F>(&self, apply: F) -> Result<(Vec<Post>, bool)>
    where
        F: FnOnce(&mut Vec<Post>) -> Result<bool>,
    {
        self.modify_entry(keys::POSTS, Vec::new, apply)
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Stored accounts, or one disconnected account per platform
    pub fn load_accounts(&self) -> Result<Vec<SocialAccount>> {
        Ok(self
            .load_entry(keys::ACCOUNTS)?
            .unwrap_or_else(SocialAccount::defaults))
    }

    pub fn save_accounts(&self, accounts: &[SocialAccount]) -> Result<()> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        self.save_entry(keys::ACCOUNTS, accounts)
    }

    pub fn modify_accounts<F>(&self, apply: F) -> Result<(Vec<SocialAccount>, bool)>
    where
        F: FnOnce(&mut Vec<SocialAccount>) -> Result<bool>,
    {
        self.modify_entry(keys::ACCOUNTS, SocialAccount::defaults, apply)
    }

    // ------------------------------------------------------------------
    // Business profile
    // ------------------------------------------------------------------

    pub fn load_profile(&self) -> Result<Option<BusinessProfile>> {
        self.load_entry(keys::PROFILE)
    }

    pub fn save_profile(&self, profile: &BusinessProfile) -> Result<()> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        self.save_entry(keys::PROFILE, profile)
    }

    // ------------------------------------------------------------------
    // API key
    // ------------------------------------------------------------------

    /// The posting API key; blank values count as absent
    pub fn load_api_key(&self) -> Result<Option<SecretString>> {
        let key: Option<String> = self.load_entry(keys::API_KEY)?;
        Ok(key
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from))
    }

    /// Store the posting API key; a blank key clears it
    pub fn save_api_key(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        if key.trim().is_empty() {
            return self.backend.remove(keys::API_KEY);
        }
        self.save_entry(keys::API_KEY, key)
    }

    pub fn clear_api_key(&self) -> Result<()> {
        self.save_api_key("")
    }

    // ------------------------------------------------------------------
    // Assets
    // ------------------------------------------------------------------

    pub fn load_assets(&self) -> Result<Vec<Asset>> {
        Ok(self.load_entry(keys::ASSETS)?.unwrap_or_default())
    }

    pub fn save_assets(&self, assets: &[Asset]) -> Result<()> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        self.save_entry(keys::ASSETS, assets)
    }

    pub fn modify_assets<F>(&self, apply: F) -> Result<(Vec<Asset>, bool)>
    where
        F: FnOnce(&mut Vec<Asset>) -> Result<bool>,
    {
        self.modify_entry(keys::ASSETS, Vec::new, apply)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("backend", &self.backend.backend_name())
            .finish()
    }
}
