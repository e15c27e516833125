//! Configuration
//!
//! Layered configuration: built-in defaults, then an optional file, then
//! `TWINLINK__*` environment variables.

mod environment;
mod facade;
mod merge;

pub use facade::ConfigLoader;

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TwinlinkConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub feed: FeedConfig,
}

/// Sizing and recovery of the change feed and dispatch channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Change notifications buffered per subscriber before it lags
    #[serde(default = "default_capacity")]
    pub change_capacity: usize,

    /// Write commands buffered per protocol subscriber
    #[serde(default = "default_capacity")]
    pub dispatch_capacity: usize,

    /// Rebuild bindings from the store when change notifications were dropped
    #[serde(default = "default_true")]
    pub resync_on_lag: bool,
}

fn default_capacity() -> usize {
    1024
}

fn default_true() -> bool {
    true
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            change_capacity: default_capacity(),
            dispatch_capacity: default_capacity(),
            resync_on_lag: default_true(),
        }
    }
}
