//! Asset Store
//!
//! Query port onto the persistent asset store. The linking engine only reads
//! through this port; assets are created and changed elsewhere.

pub mod memory;

pub use memory::MemoryAssetStore;

use crate::asset::{Asset, AssetType, AttributeRef};
use crate::error::ApiError;
use async_trait::async_trait;

/// Structured predicate over assets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetQuery {
    All,
    /// Assets of the given type
    OfType(AssetType),
    /// Assets with at least one attribute whose agent link targets the reference
    AgentLinkedTo(AttributeRef),
}

impl AssetQuery {
    pub fn matches(&self, asset: &Asset) -> bool {
        match self {
            AssetQuery::All => true,
            AssetQuery::OfType(asset_type) => asset.asset_type == *asset_type,
            AssetQuery::AgentLinkedTo(target) => asset
                .attributes
                .iter()
                .any(|attribute| attribute.agent_link().as_ref() == Some(target)),
        }
    }
}

/// Asset store query interface
///
/// Returned assets have their attributes populated.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn find_all(&self, query: &AssetQuery) -> Result<Vec<Asset>, ApiError>;
}
