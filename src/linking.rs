//! Linking Engine
//!
//! Binds agent-linked attributes to the protocol behind their configuration.
//! Linking a configuration always re-derives the bound attribute set from the
//! asset store instead of trusting whatever event triggered it. Whichever of
//! "agent created" and "linked asset created" is processed last therefore
//! establishes every binding that is valid at that moment, and the two event
//! streams need no ordering between them.

use crate::asset::{AssetAttribute, AssetType, AttributeRef, ProtocolConfiguration};
use crate::error::ApiError;
use crate::protocol::ProtocolSet;
use crate::registry::BindingRegistry;
use crate::store::{AssetQuery, AssetStore};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Attributes that resolve to the same protocol configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeGroup {
    pub configuration: ProtocolConfiguration,
    pub attributes: Vec<AssetAttribute>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Link,
    Unlink,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Link => f.write_str("link"),
            Direction::Unlink => f.write_str("unlink"),
        }
    }
}

/// Drives protocol link/unlink calls and keeps the binding registry current
pub struct LinkingEngine {
    registry: Arc<BindingRegistry>,
    protocols: Arc<ProtocolSet>,
    store: Arc<dyn AssetStore>,
}

impl LinkingEngine {
    pub fn new(
        registry: Arc<BindingRegistry>,
        protocols: Arc<ProtocolSet>,
        store: Arc<dyn AssetStore>,
    ) -> Self {
        Self {
            registry,
            protocols,
            store,
        }
    }

    pub fn registry(&self) -> &Arc<BindingRegistry> {
        &self.registry
    }

    pub fn protocols(&self) -> &Arc<ProtocolSet> {
        &self.protocols
    }

    /// Activate a configuration and link every attribute pointing at it
    ///
    /// Safe to repeat: discovery re-links the same attribute set and the
    /// registry keeps a single entry per reference.
    pub async fn link_configuration(
        &self,
        configuration: ProtocolConfiguration,
    ) -> Result<(), ApiError> {
        let reference = configuration.reference().clone();
        trace!(configuration = %reference, "Linking all attributes using protocol configuration");

        self.registry.register(configuration);

        let attributes = self.discover(&reference).await?;
        let groups = self.group_agent_linked_attributes(attributes, |attribute| {
            attribute.agent_link().as_ref() == Some(&reference)
        });
        self.apply_groups(&groups, Direction::Link);
        Ok(())
    }

    /// Unlink every attribute pointing at a configuration, then deactivate it
    ///
    /// Discovery runs while the configuration is still registered so the
    /// attributes resolve to it; removal happens even if discovery failed.
    pub async fn unlink_configuration(
        &self,
        configuration: &ProtocolConfiguration,
    ) -> Result<(), ApiError> {
        let reference = configuration.reference();
        trace!(configuration = %reference, "Unlinking all attributes using protocol configuration");

        let discovered = self.discover(reference).await;
        if let Ok(attributes) = &discovered {
            let groups = self.group_agent_linked_attributes(attributes.iter().cloned(), |attribute| {
                attribute.agent_link().as_ref() == Some(reference)
            });
            self.apply_groups(&groups, Direction::Unlink);
        }

        self.registry.unregister(reference);
        discovered.map(|_| ())
    }

    /// Link a set of attributes to a configuration's protocol
    ///
    /// An unknown protocol or a failing protocol call is logged and leaves the
    /// attributes unbound. Only a malformed protocol registration is an error.
    pub fn link_attributes(
        &self,
        configuration: &ProtocolConfiguration,
        attributes: &[AssetAttribute],
    ) -> Result<(), ApiError> {
        self.invoke(configuration, attributes, Direction::Link)
    }

    /// Unlink a set of attributes from a configuration's protocol
    pub fn unlink_attributes(
        &self,
        configuration: &ProtocolConfiguration,
        attributes: &[AssetAttribute],
    ) -> Result<(), ApiError> {
        self.invoke(configuration, attributes, Direction::Unlink)
    }

    /// Group agent-linked attributes by the registered configuration they resolve to
    ///
    /// Attributes without a link, rejected by `predicate`, or whose target is
    /// not registered are dropped. Groups keep first-seen order.
    pub fn group_agent_linked_attributes<I, P>(
        &self,
        attributes: I,
        predicate: P,
    ) -> Vec<AttributeGroup>
    where
        I: IntoIterator<Item = AssetAttribute>,
        P: Fn(&AssetAttribute) -> bool,
    {
        let mut groups: Vec<AttributeGroup> = Vec::new();
        let mut index: HashMap<AttributeRef, usize> = HashMap::new();

        for attribute in attributes {
            let Some(target) = attribute.agent_link() else {
                continue;
            };
            if !predicate(&attribute) {
                continue;
            }
            let Some(configuration) = self.registry.lookup(&target) else {
                debug!(
                    attribute = %attribute.reference(),
                    configuration = %target,
                    "Agent link target not registered yet, skipping"
                );
                continue;
            };

            match index.get(&target) {
                Some(&position) => groups[position].attributes.push(attribute),
                None => {
                    index.insert(target, groups.len());
                    groups.push(AttributeGroup {
                        configuration,
                        attributes: vec![attribute],
                    });
                }
            }
        }

        groups
    }

    /// Link every configuration of every agent in the store
    ///
    /// Rebuilds the registry at startup. Returns the number of configurations
    /// that were linked without error.
    pub async fn link_all_agents(&self) -> Result<usize, ApiError> {
        let agents = self
            .store
            .find_all(&AssetQuery::OfType(AssetType::Agent))
            .await?;
        debug!(agent_count = agents.len(), "Linking all agents");

        let mut linked = 0;
        for agent in &agents {
            for configuration in agent.protocol_configurations() {
                let reference = configuration.reference().clone();
                match self.link_configuration(configuration).await {
                    Ok(()) => linked += 1,
                    Err(e) => warn!(
                        configuration = %reference,
                        error = %e,
                        "Failed to link protocol configuration"
                    ),
                }
            }
        }

        info!(
            agent_count = agents.len(),
            configurations = linked,
            "Linked protocol configurations"
        );
        Ok(linked)
    }

    /// Unlink every registered configuration
    pub async fn unlink_all(&self) {
        let configurations = self.registry.snapshot();
        debug!(configurations = configurations.len(), "Unlinking all protocol configurations");

        for configuration in &configurations {
            if let Err(e) = self.unlink_configuration(configuration).await {
                warn!(
                    configuration = %configuration.reference(),
                    error = %e,
                    "Failed to unlink protocol configuration"
                );
            }
        }
    }

    pub(crate) fn link_groups(&self, groups: &[AttributeGroup]) {
        self.apply_groups(groups, Direction::Link);
    }

    pub(crate) fn unlink_groups(&self, groups: &[AttributeGroup]) {
        self.apply_groups(groups, Direction::Unlink);
    }

    /// Query the store for attributes whose agent link targets `reference`
    async fn discover(&self, reference: &AttributeRef) -> Result<Vec<AssetAttribute>, ApiError> {
        let assets = self
            .store
            .find_all(&AssetQuery::AgentLinkedTo(reference.clone()))
            .await?;
        Ok(assets
            .iter()
            .flat_map(|asset| asset.asset_attributes())
            .filter(|attribute| attribute.agent_link().as_ref() == Some(reference))
            .collect())
    }

    fn apply_groups(&self, groups: &[AttributeGroup], direction: Direction) {
        for group in groups {
            if let Err(e) = self.invoke(&group.configuration, &group.attributes, direction) {
                error!(
                    configuration = %group.configuration.reference(),
                    error = %e,
                    "Cannot {} attributes", direction
                );
            }
        }
    }

    fn invoke(
        &self,
        configuration: &ProtocolConfiguration,
        attributes: &[AssetAttribute],
        direction: Direction,
    ) -> Result<(), ApiError> {
        let Some(protocol) = self.protocols.resolve(configuration)? else {
            error!(
                configuration = %configuration.reference(),
                protocol = configuration.protocol_name().unwrap_or(""),
                "Cannot {} protocol attributes as protocol is not available", direction
            );
            return Ok(());
        };

        trace!(
            protocol = protocol.name(),
            configuration = %configuration.reference(),
            attribute_count = attributes.len(),
            "Calling protocol {}", direction
        );
        let result = match direction {
            Direction::Link => protocol.link_attributes(attributes, configuration),
            Direction::Unlink => protocol.unlink_attributes(attributes, configuration),
        };
        if let Err(e) = result {
            warn!(
                protocol = protocol.name(),
                configuration = %configuration.reference(),
                error = %e,
                "Ignoring error on {} of protocol attributes", direction
            );
        }
        Ok(())
    }
}
