//! Binding registry: active protocol configurations by reference.

use crate::asset::{AttributeRef, ProtocolConfiguration};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Registry of currently active protocol configurations
///
/// Pure derived state, rebuilt from the asset store at startup. Every
/// operation runs under one mutex covering the whole map, so a lookup never
/// observes a partially applied change. Values are handed out as clones, so
/// the lock never outlives a single call.
#[derive(Default)]
pub struct BindingRegistry {
    configurations: Mutex<HashMap<AttributeRef, ProtocolConfiguration>>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the configuration stored under its reference
    pub fn register(&self, configuration: ProtocolConfiguration) -> Option<ProtocolConfiguration> {
        let reference = configuration.reference().clone();
        self.configurations.lock().insert(reference, configuration)
    }

    /// Remove a configuration; no-op if absent
    pub fn unregister(&self, reference: &AttributeRef) -> Option<ProtocolConfiguration> {
        self.configurations.lock().remove(reference)
    }

    pub fn lookup(&self, reference: &AttributeRef) -> Option<ProtocolConfiguration> {
        self.configurations.lock().get(reference).cloned()
    }

    pub fn contains(&self, reference: &AttributeRef) -> bool {
        self.configurations.lock().contains_key(reference)
    }

    /// Copy of every registered configuration, ordered by reference
    pub fn snapshot(&self) -> Vec<ProtocolConfiguration> {
        let mut configurations: Vec<_> = self.configurations.lock().values().cloned().collect();
        configurations.sort_by(|a, b| a.reference().cmp(b.reference()));
        configurations
    }

    pub fn len(&self) -> usize {
        self.configurations.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.lock().is_empty()
    }
}
