//! Asset Model
//!
//! Assets form the digital twin: a tree of typed nodes, each carrying named
//! attributes annotated with meta items. Agent assets hold protocol
//! configurations; ordinary assets point at them through agent links.

mod attribute;
mod configuration;
mod meta;
mod reference;

pub use attribute::{AssetAttribute, Attribute};
pub use configuration::ProtocolConfiguration;
pub use meta::{MetaItem, AGENT_LINK, PROTOCOL_CONFIGURATION};
pub use reference::AttributeRef;

use crate::types::AssetId;
use serde::{Deserialize, Serialize};

/// Asset type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    /// Container for protocol configurations
    Agent,
    Thing,
    Group,
    Building,
    Room,
}

/// A node in the asset tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    #[serde(default = "default_realm")]
    pub realm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<AssetId>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

fn default_realm() -> String {
    "master".to_string()
}

impl Asset {
    pub fn new(id: impl Into<AssetId>, name: impl Into<String>, asset_type: AssetType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            asset_type,
            realm: default_realm(),
            parent_id: None,
            attributes: Vec::new(),
        }
    }

    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<AssetId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Add an attribute, replacing any existing attribute with the same name
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.set_attribute(attribute);
        self
    }

    pub fn set_attribute(&mut self, attribute: Attribute) {
        match self.attributes.iter_mut().find(|a| a.name == attribute.name) {
            Some(existing) => *existing = attribute,
            None => self.attributes.push(attribute),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<Attribute> {
        let index = self.attributes.iter().position(|a| a.name == name)?;
        Some(self.attributes.remove(index))
    }

    pub fn is_agent(&self) -> bool {
        self.asset_type == AssetType::Agent
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// All attributes paired with this asset's id
    pub fn asset_attributes(&self) -> Vec<AssetAttribute> {
        self.attributes
            .iter()
            .map(|attribute| AssetAttribute::new(self.id.clone(), attribute.clone()))
            .collect()
    }

    /// Attributes flagged with the protocol configuration marker
    pub fn protocol_configurations(&self) -> Vec<ProtocolConfiguration> {
        self.asset_attributes()
            .into_iter()
            .filter_map(ProtocolConfiguration::from_attribute)
            .collect()
    }

    /// Attributes carrying a well-formed agent link
    pub fn agent_linked_attributes(&self) -> Vec<AssetAttribute> {
        self.asset_attributes()
            .into_iter()
            .filter(|attribute| attribute.attribute.has_agent_link())
            .collect()
    }
}
