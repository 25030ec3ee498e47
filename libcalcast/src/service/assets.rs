//! Media asset library

use std::sync::Arc;

use tracing::info;

use super::Mutation;
use crate::store::Store;
use crate::types::Asset;
use crate::{CalcastError, Result};

const UNTITLED: &str = "Untitled Image";

#[derive(Debug, Clone)]
pub struct AssetService {
    store: Arc<Store>,
}

impl AssetService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Assets, newest first
    pub fn list(&self) -> Result<Vec<Asset>> {
        self.store.load_assets()
    }

    /// Add an asset pointing at `url`
    ///
    /// A blank `name` is stored as "Untitled Image".
    pub fn add(&self, url: &str, name: &str) -> Result<Asset> {
        let url = url.trim();
        if url.is_empty() {
            return Err(CalcastError::InvalidInput("Asset URL cannot be empty".to_string()));
        }
        let name = match name.trim() {
            "" => UNTITLED,
            name => name,
        };

        let asset = Asset::new(url.to_string(), name.to_string());
        let added = asset.clone();
        self.store.modify_assets(move |assets| {
            assets.insert(0, added);
            Ok(true)
        })?;
        info!(asset_id = %asset.id, "asset added");
        Ok(asset)
    }

    pub fn delete(&self, id: &str) -> Result<Mutation<Asset>> {
        let (assets, removed) = self.store.modify_assets(|assets| {
            let before = assets.len();
            assets.retain(|a| a.id != id);
            Ok(assets.len() != before)
        })?;
        if removed {
            info!(asset_id = %id, "asset deleted");
            Ok(Mutation::Applied(assets))
        } else {
            Ok(Mutation::NotFound(assets))
        }
    }
}
