//! API key, connected accounts and the business profile

use std::sync::Arc;

use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use super::events::{Event, EventBus};
use crate::publishing::{reconcile_accounts, SocialPoster};
use crate::store::Store;
use crate::types::{BusinessProfile, SocialAccount, SocialPlatform};
use crate::{CalcastError, RemoteError, Result};

#[derive(Clone)]
pub struct AccountService {
    store: Arc<Store>,
    poster: Arc<dyn SocialPoster>,
    event_bus: EventBus,
}

impl AccountService {
    pub fn new(store: Arc<Store>, poster: Arc<dyn SocialPoster>, event_bus: EventBus) -> Self {
        Self {
            store,
            poster,
            event_bus,
        }
    }

    pub fn accounts(&self) -> Result<Vec<SocialAccount>> {
        self.store.load_accounts()
    }

    /// Ask the posting service which platforms are linked and overwrite the
    /// stored accounts with the answer
    ///
    /// # Errors
    ///
    /// `MissingCredential` when no key is stored, otherwise whatever the
    /// posting service returns. Stored accounts are untouched on error.
    pub async fn sync_profiles(&self) -> Result<Vec<SocialAccount>> {
        let key = self.require_api_key()?;
        let codes = self.poster.connected_platforms(key.expose_secret()).await?;
        debug!(poster = self.poster.name(), ?codes, "connected platform codes");

        let accounts = reconcile_accounts(&codes);
        self.store.save_accounts(&accounts)?;

        let connected: Vec<String> = accounts
            .iter()
            .filter(|a| a.connected)
            .map(|a| a.platform.to_string())
            .collect();
        info!(connected = connected.len(), "accounts synced");
        self.event_bus.emit(Event::AccountsSynced { connected });
        Ok(accounts)
    }

    /// Mark one platform connected or disconnected by hand
    ///
    /// A connected account gets a placeholder `user_NNNN` name.
    pub fn set_connected(&self, platform: SocialPlatform, connected: bool) -> Result<Vec<SocialAccount>> {
        let username = connected.then(|| format!("user_{}", rand::thread_rng().gen_range(0..9999)));
        let (accounts, _) = self.store.modify_accounts(|accounts| {
            match accounts.iter_mut().find(|a| a.platform == platform) {
                Some(account) => {
                    account.connected = connected;
                    account.username = username;
                }
                None => accounts.push(SocialAccount {
                    platform,
                    connected,
                    username,
                }),
            }
            Ok(true)
        })?;
        info!(%platform, connected, "account toggled");
        Ok(accounts)
    }

    /// Store the posting API key; a blank key clears it
    pub fn set_api_key(&self, key: &str) -> Result<()> {
        self.store.save_api_key(key.trim())?;
        info!(stored = !key.trim().is_empty(), "API key updated");
        Ok(())
    }

    pub fn api_key(&self) -> Result<Option<SecretString>> {
        self.store.load_api_key()
    }

    pub fn has_api_key(&self) -> Result<bool> {
        Ok(self.store.load_api_key()?.is_some())
    }

    pub fn clear_api_key(&self) -> Result<()> {
        self.store.clear_api_key()?;
        info!("API key cleared");
        Ok(())
    }

    fn require_api_key(&self) -> Result<SecretString> {
        self.store.load_api_key()?.ok_or_else(|| {
            RemoteError::MissingCredential(
                "Ayrshare API key is not set (run `cal-setup key set`)".to_string(),
            )
            .into()
        })
    }

    pub fn profile(&self) -> Result<Option<BusinessProfile>> {
        self.store.load_profile()
    }

    /// Save the business profile; the name is required
    pub fn save_profile(&self, profile: &BusinessProfile) -> Result<()> {
        if profile.name.trim().is_empty() {
            return Err(CalcastError::InvalidInput(
                "Business name cannot be empty".to_string(),
            ));
        }
        self.store.save_profile(profile)?;
        info!(name = %profile.name, "business profile saved");
        Ok(())
    }
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService")
            .field("poster", &self.poster.name())
            .finish()
    }
}
