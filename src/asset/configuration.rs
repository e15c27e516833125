use super::{AssetAttribute, Attribute, AttributeRef};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One protocol instance, declared as a marked attribute on an agent
///
/// The attribute value names the protocol implementation; its remaining
/// meta items carry protocol-specific settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolConfiguration {
    reference: AttributeRef,
    attribute: Attribute,
}

impl ProtocolConfiguration {
    /// Wrap an attribute if it carries the configuration marker
    pub fn from_attribute(attribute: AssetAttribute) -> Option<Self> {
        if !attribute.attribute.is_protocol_configuration() {
            return None;
        }
        Some(Self {
            reference: attribute.reference(),
            attribute: attribute.attribute,
        })
    }

    pub fn reference(&self) -> &AttributeRef {
        &self.reference
    }

    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }

    /// Declared protocol implementation name
    pub fn protocol_name(&self) -> Option<&str> {
        self.attribute.value_as_str()
    }

    /// Protocol-specific setting stored as a meta item
    pub fn setting(&self, name: &str) -> Option<&Value> {
        self.attribute.meta_item(name).map(|item| &item.value)
    }
}
