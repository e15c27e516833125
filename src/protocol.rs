//! Protocol Capabilities
//!
//! A protocol performs device I/O for the attributes bound to one of its
//! configurations. Implementations are registered in a [`ProtocolSet`], which
//! resolves a configuration to the protocol whose name it declares.

use crate::asset::{AssetAttribute, ProtocolConfiguration};
use crate::error::{ApiError, ProtocolError};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Pluggable protocol implementation
///
/// Linking the same attributes to the same configuration twice must be
/// harmless: the linking engine re-links on every discovery pass.
pub trait Protocol: Send + Sync {
    /// Unique, non-empty protocol name
    fn name(&self) -> &str;

    /// Start servicing the attributes under the given configuration
    fn link_attributes(
        &self,
        attributes: &[AssetAttribute],
        configuration: &ProtocolConfiguration,
    ) -> Result<(), ProtocolError>;

    /// Stop servicing the attributes under the given configuration
    fn unlink_attributes(
        &self,
        attributes: &[AssetAttribute],
        configuration: &ProtocolConfiguration,
    ) -> Result<(), ProtocolError>;
}

struct RegisteredProtocol {
    type_name: &'static str,
    protocol: Arc<dyn Protocol>,
}

/// The set of currently available protocol implementations
#[derive(Default)]
pub struct ProtocolSet {
    protocols: RwLock<Vec<RegisteredProtocol>>,
}

impl ProtocolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a protocol implementation
    ///
    /// Rejects empty and duplicate names.
    pub fn register<P: Protocol + 'static>(&self, protocol: Arc<P>) -> Result<(), ApiError> {
        let type_name = std::any::type_name::<P>();
        let name = protocol.name().to_string();
        if name.is_empty() {
            return Err(ApiError::EmptyProtocolName {
                type_name: type_name.to_string(),
            });
        }

        let mut protocols = self.protocols.write();
        if protocols.iter().any(|p| p.protocol.name() == name) {
            return Err(ApiError::DuplicateProtocol(name));
        }
        protocols.push(RegisteredProtocol {
            type_name,
            protocol,
        });
        debug!(protocol = %name, "Registered protocol");
        Ok(())
    }

    /// Remove a protocol by name
    pub fn deregister(&self, name: &str) -> Option<Arc<dyn Protocol>> {
        let mut protocols = self.protocols.write();
        let index = protocols.iter().position(|p| p.protocol.name() == name)?;
        Some(protocols.remove(index).protocol)
    }

    pub fn names(&self) -> Vec<String> {
        self.protocols
            .read()
            .iter()
            .map(|p| p.protocol.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.protocols.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.protocols.read().is_empty()
    }

    /// Find the protocol named by a configuration's value
    ///
    /// Every registered protocol's name is checked on each call; an empty one
    /// fails the resolution regardless of which configuration asked. `Ok(None)`
    /// means no protocol matches.
    pub fn resolve(
        &self,
        configuration: &ProtocolConfiguration,
    ) -> Result<Option<Arc<dyn Protocol>>, ApiError> {
        let protocols = self.protocols.read();

        if let Some(invalid) = protocols.iter().find(|p| p.protocol.name().is_empty()) {
            return Err(ApiError::EmptyProtocolName {
                type_name: invalid.type_name.to_string(),
            });
        }

        let Some(wanted) = configuration.protocol_name() else {
            return Ok(None);
        };

        Ok(protocols
            .iter()
            .find(|p| p.protocol.name() == wanted)
            .map(|p| Arc::clone(&p.protocol)))
    }
}
