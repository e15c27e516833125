use crate::types::AssetId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable (asset, attribute name) key
///
/// Identifies protocol configurations as well as agent-linked attributes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeRef {
    pub asset_id: AssetId,
    pub attribute_name: String,
}

impl AttributeRef {
    pub fn new(asset_id: impl Into<AssetId>, attribute_name: impl Into<String>) -> Self {
        Self {
            asset_id: asset_id.into(),
            attribute_name: attribute_name.into(),
        }
    }
}

impl fmt::Display for AttributeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.asset_id, self.attribute_name)
    }
}
