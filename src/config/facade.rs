//! ConfigLoader facade delegating to merge service.

use super::merge::MergeService;
use super::TwinlinkConfig;
use config::ConfigError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from defaults, an optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<TwinlinkConfig, ConfigError> {
        MergeService::load(path)
    }

    /// Create default configuration.
    pub fn default() -> TwinlinkConfig {
        TwinlinkConfig::default()
    }
}
