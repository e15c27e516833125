use crate::asset::{Asset, Attribute};
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Name of the snapshot field holding an asset's attributes
pub const ATTRIBUTES_FIELD: &str = "attributes";

/// What happened to the entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

/// Full persisted state of an entity, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSnapshot(BTreeMap<String, Value>);

impl FieldSnapshot {
    pub fn new(fields: BTreeMap<String, Value>) -> Self {
        Self(fields)
    }

    /// Capture an asset as persisted
    pub fn of(asset: &Asset) -> Result<Self, ApiError> {
        match serde_json::to_value(asset) {
            Ok(Value::Object(fields)) => Ok(Self(fields.into_iter().collect())),
            Ok(other) => Err(ApiError::Snapshot(format!(
                "asset {} did not serialize to an object: {}",
                asset.id, other
            ))),
            Err(e) => Err(ApiError::Snapshot(e.to_string())),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    /// Decode the attributes field; a missing field means no attributes
    pub fn attributes(&self) -> Result<Vec<Attribute>, ApiError> {
        match self.field(ATTRIBUTES_FIELD) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                ApiError::Snapshot(format!("invalid {} field: {}", ATTRIBUTES_FIELD, e))
            }),
        }
    }
}

/// Persistence change of one asset
///
/// Updates carry the state before and after the change; creates and deletes
/// describe the asset through `asset` alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeNotification {
    pub kind: ChangeKind,
    pub asset: Asset,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_state: Option<FieldSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_state: Option<FieldSnapshot>,
}

impl ChangeNotification {
    pub fn created(asset: Asset) -> Self {
        Self {
            kind: ChangeKind::Create,
            asset,
            previous_state: None,
            current_state: None,
        }
    }

    pub fn deleted(asset: Asset) -> Self {
        Self {
            kind: ChangeKind::Delete,
            asset,
            previous_state: None,
            current_state: None,
        }
    }

    /// Update from `before` to `after`, snapshotting both
    pub fn updated(before: &Asset, after: Asset) -> Result<Self, ApiError> {
        let previous_state = FieldSnapshot::of(before)?;
        let current_state = FieldSnapshot::of(&after)?;
        Ok(Self {
            kind: ChangeKind::Update,
            asset: after,
            previous_state: Some(previous_state),
            current_state: Some(current_state),
        })
    }

    /// Whether the attributes field differs between the two snapshots
    pub fn attributes_changed(&self) -> bool {
        let before = self
            .previous_state
            .as_ref()
            .and_then(|s| s.field(ATTRIBUTES_FIELD));
        let after = self
            .current_state
            .as_ref()
            .and_then(|s| s.field(ATTRIBUTES_FIELD));
        before != after
    }

    /// Decoded (before, after) attributes of an update
    pub fn attribute_snapshots(&self) -> Result<(Vec<Attribute>, Vec<Attribute>), ApiError> {
        let before = match &self.previous_state {
            Some(snapshot) => snapshot.attributes()?,
            None => Vec::new(),
        };
        let after = match &self.current_state {
            Some(snapshot) => snapshot.attributes()?,
            None => Vec::new(),
        };
        Ok((before, after))
    }
}
