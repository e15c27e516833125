//! In-process asset store backed by a map.

use super::{AssetQuery, AssetStore};
use crate::asset::Asset;
use crate::error::ApiError;
use crate::types::AssetId;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::Path;

/// Asset store held entirely in memory
///
/// Iteration order is by asset id, which keeps query results deterministic.
#[derive(Default)]
pub struct MemoryAssetStore {
    assets: RwLock<BTreeMap<AssetId, Asset>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_assets(assets: impl IntoIterator<Item = Asset>) -> Self {
        let store = Self::new();
        for asset in assets {
            store.merge(asset);
        }
        store
    }

    /// Load a JSON array of assets
    pub fn load_from_file(path: &Path) -> Result<Self, ApiError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ApiError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        let assets: Vec<Asset> = serde_json::from_str(&content).map_err(|e| {
            ApiError::Store(format!("Failed to parse assets in {}: {}", path.display(), e))
        })?;
        Ok(Self::from_assets(assets))
    }

    /// Insert or replace an asset, returning the previous version
    pub fn merge(&self, asset: Asset) -> Option<Asset> {
        self.assets.write().insert(asset.id.clone(), asset)
    }

    pub fn delete(&self, id: &AssetId) -> Option<Asset> {
        self.assets.write().remove(id)
    }

    pub fn get(&self, id: &AssetId) -> Option<Asset> {
        self.assets.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.assets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.read().is_empty()
    }

    fn query(&self, query: &AssetQuery) -> Vec<Asset> {
        self.assets
            .read()
            .values()
            .filter(|asset| query.matches(asset))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn find_all(&self, query: &AssetQuery) -> Result<Vec<Asset>, ApiError> {
        Ok(self.query(query))
    }
}
