//! Change Reactor
//!
//! Turns asset change notifications into incremental link/unlink calls.
//! Agent changes add or remove protocol configurations; changes to other
//! assets add or remove individual agent-linked attributes.

use crate::asset::{Asset, AssetAttribute, Attribute, ProtocolConfiguration};
use crate::error::ApiError;
use crate::events::{BusError, BusReceiver, ChangeKind, ChangeNotification};
use crate::linking::LinkingEngine;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Applies change notifications to the linking engine
pub struct ChangeReactor {
    engine: Arc<LinkingEngine>,
    resync_on_lag: bool,
}

impl ChangeReactor {
    pub fn new(engine: Arc<LinkingEngine>) -> Self {
        Self {
            engine,
            resync_on_lag: true,
        }
    }

    /// Whether to rebuild bindings from the store after missed notifications
    pub fn with_resync_on_lag(mut self, resync_on_lag: bool) -> Self {
        self.resync_on_lag = resync_on_lag;
        self
    }

    pub fn engine(&self) -> &Arc<LinkingEngine> {
        &self.engine
    }

    /// Consume notifications until the feed closes
    pub async fn run(&self, mut receiver: BusReceiver<ChangeNotification>) {
        info!("Change reactor started");
        loop {
            match receiver.recv().await {
                Ok(notification) => {
                    if let Err(e) = self.process(&notification).await {
                        warn!(
                            asset = %notification.asset.id,
                            kind = ?notification.kind,
                            error = %e,
                            "Failed to process change notification"
                        );
                    }
                }
                Err(BusError::Lagged(missed)) => {
                    warn!(missed, "Change notifications were dropped");
                    if self.resync_on_lag {
                        if let Err(e) = self.engine.link_all_agents().await {
                            warn!(error = %e, "Resync after dropped notifications failed");
                        }
                    }
                }
                Err(BusError::Closed) | Err(BusError::Empty) => break,
            }
        }
        info!("Change reactor stopped");
    }

    /// Process one change notification
    pub async fn process(&self, notification: &ChangeNotification) -> Result<(), ApiError> {
        if notification.asset.is_agent() {
            self.process_agent_change(notification).await
        } else {
            self.process_asset_change(notification)
        }
    }

    async fn process_agent_change(&self, notification: &ChangeNotification) -> Result<(), ApiError> {
        let agent = &notification.asset;
        trace!(agent = %agent.id, kind = ?notification.kind, "Processing agent change");

        match notification.kind {
            ChangeKind::Create => {
                for configuration in agent.protocol_configurations() {
                    self.link_configuration(configuration).await;
                }
            }
            ChangeKind::Update => {
                if !notification.attributes_changed() {
                    return Ok(());
                }
                let (before, after) = notification.attribute_snapshots()?;
                let before = configurations(agent, before);
                let after = configurations(agent, after);

                // Full equality, timestamps included
                for old in before.iter().filter(|old| !after.contains(old)) {
                    self.unlink_configuration(old).await;
                }
                for new in after.into_iter().filter(|new| !before.contains(new)) {
                    self.link_configuration(new).await;
                }
            }
            ChangeKind::Delete => {
                for configuration in agent.protocol_configurations() {
                    self.unlink_configuration(&configuration).await;
                }
            }
        }
        Ok(())
    }

    fn process_asset_change(&self, notification: &ChangeNotification) -> Result<(), ApiError> {
        let asset = &notification.asset;
        trace!(asset = %asset.id, kind = ?notification.kind, "Processing asset change");

        match notification.kind {
            ChangeKind::Create => {
                // Links to configurations not registered yet are picked up
                // when the agent's own create runs discovery
                let groups = self
                    .engine
                    .group_agent_linked_attributes(asset.agent_linked_attributes(), |_| true);
                self.engine.link_groups(&groups);
            }
            ChangeKind::Update => {
                if !notification.attributes_changed() {
                    return Ok(());
                }
                let (before, after) = notification.attribute_snapshots()?;
                let before = agent_linked(asset, before);
                let after = agent_linked(asset, after);

                let removed: Vec<AssetAttribute> = before
                    .iter()
                    .filter(|old| !after.iter().any(|new| same_binding(old, new)))
                    .cloned()
                    .collect();
                let added: Vec<AssetAttribute> = after
                    .iter()
                    .filter(|new| !before.iter().any(|old| same_binding(old, new)))
                    .cloned()
                    .collect();
                debug!(
                    asset = %asset.id,
                    removed = removed.len(),
                    added = added.len(),
                    "Agent linked attributes changed"
                );

                let groups = self.engine.group_agent_linked_attributes(removed, |_| true);
                self.engine.unlink_groups(&groups);
                let groups = self.engine.group_agent_linked_attributes(added, |_| true);
                self.engine.link_groups(&groups);
            }
            ChangeKind::Delete => {
                let groups = self
                    .engine
                    .group_agent_linked_attributes(asset.agent_linked_attributes(), |_| true);
                self.engine.unlink_groups(&groups);
            }
        }
        Ok(())
    }

    async fn link_configuration(&self, configuration: ProtocolConfiguration) {
        let reference = configuration.reference().clone();
        if let Err(e) = self.engine.link_configuration(configuration).await {
            warn!(configuration = %reference, error = %e, "Failed to link protocol configuration");
        }
    }

    async fn unlink_configuration(&self, configuration: &ProtocolConfiguration) {
        if let Err(e) = self.engine.unlink_configuration(configuration).await {
            warn!(
                configuration = %configuration.reference(),
                error = %e,
                "Failed to unlink protocol configuration"
            );
        }
    }
}

fn configurations(agent: &Asset, attributes: Vec<Attribute>) -> Vec<ProtocolConfiguration> {
    attributes
        .into_iter()
        .filter_map(|attribute| {
            ProtocolConfiguration::from_attribute(AssetAttribute::new(agent.id.clone(), attribute))
        })
        .collect()
}

fn agent_linked(asset: &Asset, attributes: Vec<Attribute>) -> Vec<AssetAttribute> {
    attributes
        .into_iter()
        .filter(Attribute::has_agent_link)
        .map(|attribute| AssetAttribute::new(asset.id.clone(), attribute))
        .collect()
}

/// A bare value refresh does not change how an attribute is bound
fn same_binding(a: &AssetAttribute, b: &AssetAttribute) -> bool {
    a.asset_id == b.asset_id && a.attribute.eq_ignoring_timestamp(&b.attribute)
}
