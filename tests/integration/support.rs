//! Shared builders and a protocol that records every call it receives.

use parking_lot::Mutex;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use twinlink::asset::{
    Asset, AssetAttribute, AssetType, Attribute, AttributeRef, MetaItem, ProtocolConfiguration,
};
use twinlink::error::ProtocolError;
use twinlink::linking::LinkingEngine;
use twinlink::protocol::{Protocol, ProtocolSet};
use twinlink::reactor::ChangeReactor;
use twinlink::registry::BindingRegistry;
use twinlink::store::MemoryAssetStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Link,
    Unlink,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub direction: Direction,
    pub configuration: AttributeRef,
    pub attributes: Vec<AttributeRef>,
}

pub struct RecordingProtocol {
    name: String,
    failing: bool,
    calls: Mutex<Vec<Call>>,
}

impl RecordingProtocol {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            failing: false,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Records calls but reports every one of them as failed
    pub fn failing(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            failing: true,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Attributes whose most recent call was a link
    pub fn bound(&self) -> BTreeSet<AttributeRef> {
        let mut bound = BTreeSet::new();
        for call in self.calls.lock().iter() {
            for attribute in &call.attributes {
                match call.direction {
                    Direction::Link => bound.insert(attribute.clone()),
                    Direction::Unlink => bound.remove(attribute),
                };
            }
        }
        bound
    }

    fn record(
        &self,
        direction: Direction,
        attributes: &[AssetAttribute],
        configuration: &ProtocolConfiguration,
    ) -> Result<(), ProtocolError> {
        self.calls.lock().push(Call {
            direction,
            configuration: configuration.reference().clone(),
            attributes: attributes.iter().map(AssetAttribute::reference).collect(),
        });
        if self.failing {
            return Err(ProtocolError::Io("device unreachable".to_string()));
        }
        Ok(())
    }
}

impl Protocol for RecordingProtocol {
    fn name(&self) -> &str {
        &self.name
    }

    fn link_attributes(
        &self,
        attributes: &[AssetAttribute],
        configuration: &ProtocolConfiguration,
    ) -> Result<(), ProtocolError> {
        self.record(Direction::Link, attributes, configuration)
    }

    fn unlink_attributes(
        &self,
        attributes: &[AssetAttribute],
        configuration: &ProtocolConfiguration,
    ) -> Result<(), ProtocolError> {
        self.record(Direction::Unlink, attributes, configuration)
    }
}

pub fn configuration(name: &str, protocol: &str) -> Attribute {
    Attribute::new(name)
        .with_value(json!(protocol))
        .with_meta(MetaItem::protocol_configuration())
}

pub fn linked(name: &str, agent: &str, cfg: &str) -> Attribute {
    Attribute::new(name).with_meta(MetaItem::agent_link(&AttributeRef::new(agent, cfg)))
}

/// Agent carrying one configuration per `(name, protocol)` pair
pub fn agent(id: &str, configurations: &[(&str, &str)]) -> Asset {
    configurations
        .iter()
        .fold(Asset::new(id, id, AssetType::Agent), |asset, (name, protocol)| {
            asset.with_attribute(configuration(name, protocol))
        })
}

/// Thing with one attribute per `(name, agent, configuration)` link
pub fn thing(id: &str, links: &[(&str, &str, &str)]) -> Asset {
    links
        .iter()
        .fold(Asset::new(id, id, AssetType::Thing), |asset, (name, agent, cfg)| {
            asset.with_attribute(linked(name, agent, cfg))
        })
}

pub fn reference(asset: &str, attribute: &str) -> AttributeRef {
    AttributeRef::new(asset, attribute)
}

pub struct Harness {
    pub store: Arc<MemoryAssetStore>,
    pub engine: Arc<LinkingEngine>,
    pub reactor: ChangeReactor,
}

impl Harness {
    pub fn new(protocols: &[Arc<RecordingProtocol>]) -> Self {
        let set = Arc::new(ProtocolSet::new());
        for protocol in protocols {
            set.register(Arc::clone(protocol)).unwrap();
        }
        let store = Arc::new(MemoryAssetStore::new());
        let engine = Arc::new(LinkingEngine::new(
            Arc::new(BindingRegistry::new()),
            set,
            store.clone(),
        ));
        let reactor = ChangeReactor::new(Arc::clone(&engine));
        Self {
            store,
            engine,
            reactor,
        }
    }

    pub fn registry(&self) -> &Arc<BindingRegistry> {
        self.engine.registry()
    }
}
