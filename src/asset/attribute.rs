use super::meta::{MetaItem, AGENT_LINK, PROTOCOL_CONFIGURATION};
use super::AttributeRef;
use crate::types::AssetId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Named, timestamped value on an asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub meta: Vec<MetaItem>,
}

impl Attribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            value_timestamp: None,
            meta: Vec::new(),
        }
    }

    /// Set the value, stamping it with the current time
    pub fn with_value(self, value: Value) -> Self {
        self.with_value_at(value, Utc::now())
    }

    pub fn with_value_at(mut self, value: Value, timestamp: DateTime<Utc>) -> Self {
        self.value = Some(value);
        self.value_timestamp = Some(timestamp);
        self
    }

    pub fn with_meta(mut self, item: MetaItem) -> Self {
        self.meta.push(item);
        self
    }

    pub fn meta_item(&self, name: &str) -> Option<&MetaItem> {
        self.meta.iter().find(|item| item.is(name))
    }

    pub fn has_meta(&self, name: &str) -> bool {
        self.meta_item(name).is_some()
    }

    pub fn value_as_str(&self) -> Option<&str> {
        self.value.as_ref().and_then(Value::as_str)
    }

    /// Target of this attribute's agent link
    ///
    /// A link meta item whose value is not a valid reference counts as absent.
    pub fn agent_link(&self) -> Option<AttributeRef> {
        let item = self.meta_item(AGENT_LINK)?;
        match serde_json::from_value(item.value.clone()) {
            Ok(target) => Some(target),
            Err(e) => {
                tracing::trace!(attribute = %self.name, error = %e, "Malformed agent link");
                None
            }
        }
    }

    pub fn has_agent_link(&self) -> bool {
        self.agent_link().is_some()
    }

    pub fn is_protocol_configuration(&self) -> bool {
        self.has_meta(PROTOCOL_CONFIGURATION)
    }

    /// Structural equality that disregards the value timestamp
    ///
    /// A bare value refresh does not change how an attribute is bound.
    pub fn eq_ignoring_timestamp(&self, other: &Attribute) -> bool {
        self.name == other.name && self.value == other.value && self.meta == other.meta
    }
}

/// An attribute together with the id of the asset that owns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetAttribute {
    pub asset_id: AssetId,
    #[serde(flatten)]
    pub attribute: Attribute,
}

impl AssetAttribute {
    pub fn new(asset_id: AssetId, attribute: Attribute) -> Self {
        Self {
            asset_id,
            attribute,
        }
    }

    pub fn reference(&self) -> AttributeRef {
        AttributeRef::new(self.asset_id.clone(), self.attribute.name.clone())
    }

    pub fn name(&self) -> &str {
        &self.attribute.name
    }

    pub fn agent_link(&self) -> Option<AttributeRef> {
        self.attribute.agent_link()
    }
}
