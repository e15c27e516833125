//! Twinlink: Agent and Protocol Linking for a Digital Twin
//!
//! Keeps a registry of protocol configurations declared on agent assets,
//! binds agent-linked attributes to the protocol behind their configuration as
//! assets change, and routes twin-originated attribute writes out to protocols.

pub mod asset;
pub mod config;
pub mod error;
pub mod events;
pub mod linking;
pub mod logging;
pub mod protocol;
pub mod reactor;
pub mod registry;
pub mod router;
pub mod service;
pub mod store;
pub mod tooling;
pub mod types;
