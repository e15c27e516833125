use crate::asset::{Asset, Attribute, AttributeRef};
use crate::error::ApiError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of routing an attribute state event
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProcessingStatus {
    /// Not protocol relevant; downstream consumers carry on as usual
    #[default]
    Unprocessed,
    /// Forwarded to a protocol
    Handled,
    Error(ApiError),
}

/// A live change of one attribute's state
///
/// Northbound events were pushed into the twin by a protocol; southbound
/// events originate in the twin and are headed for a device.
#[derive(Debug, Clone)]
pub struct AttributeStateEvent {
    pub asset: Asset,
    pub attribute: Attribute,
    northbound: bool,
    status: ProcessingStatus,
}

impl AttributeStateEvent {
    pub fn southbound(asset: Asset, attribute: Attribute) -> Self {
        Self {
            asset,
            attribute,
            northbound: false,
            status: ProcessingStatus::Unprocessed,
        }
    }

    pub fn northbound(asset: Asset, attribute: Attribute) -> Self {
        Self {
            northbound: true,
            ..Self::southbound(asset, attribute)
        }
    }

    pub fn is_northbound(&self) -> bool {
        self.northbound
    }

    pub fn reference(&self) -> AttributeRef {
        AttributeRef::new(self.asset.id.clone(), self.attribute.name.clone())
    }

    pub fn status(&self) -> &ProcessingStatus {
        &self.status
    }

    pub fn set_handled(&mut self) {
        self.status = ProcessingStatus::Handled;
    }

    pub fn set_error(&mut self, error: ApiError) {
        self.status = ProcessingStatus::Error(error);
    }

    /// Write command carrying the attribute's new value
    ///
    /// `None` when the attribute has no value timestamp.
    pub fn write_command(&self) -> Option<AttributeWriteCommand> {
        let timestamp = self.attribute.value_timestamp?;
        Some(AttributeWriteCommand {
            attribute: self.reference(),
            value: self.attribute.value.clone(),
            timestamp,
        })
    }
}

/// Request for a protocol to write a value to a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeWriteCommand {
    pub attribute: AttributeRef,
    pub value: Option<Value>,
    pub timestamp: DateTime<Utc>,
}
