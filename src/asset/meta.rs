use super::AttributeRef;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Meta item name marking an attribute as bound to a protocol configuration
pub const AGENT_LINK: &str = "urn:twinlink:meta:agent-link";

/// Meta item name marking an agent attribute as a protocol configuration
pub const PROTOCOL_CONFIGURATION: &str = "urn:twinlink:meta:protocol-configuration";

/// URI-named annotation on an attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaItem {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

impl MetaItem {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn agent_link(target: &AttributeRef) -> Self {
        let value = serde_json::to_value(target).unwrap_or(Value::Null);
        Self::new(AGENT_LINK, value)
    }

    pub fn protocol_configuration() -> Self {
        Self::new(PROTOCOL_CONFIGURATION, Value::Bool(true))
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }
}
