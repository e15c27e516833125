//! MergeService: layers sources and deserializes to TwinlinkConfig.

use super::environment;
use super::TwinlinkConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File};
use std::path::Path;

pub(crate) struct MergeService;

impl MergeService {
    /// Precedence: defaults (lowest) -> file -> environment (highest).
    pub(crate) fn load(path: Option<&Path>) -> Result<TwinlinkConfig, ConfigError> {
        let mut builder = builder_with_defaults()?;
        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.display().to_string()));
            }
            builder = builder.add_source(File::from(path));
        }
        let builder = environment::add_to_builder(builder);

        builder.build()?.try_deserialize()
    }
}

fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = TwinlinkConfig::default();
    Ok(Config::builder()
        .set_default("feed.change_capacity", defaults.feed.change_capacity as u64)?
        .set_default("feed.dispatch_capacity", defaults.feed.dispatch_capacity as u64)?
        .set_default("feed.resync_on_lag", defaults.feed.resync_on_lag)?
        .set_default("logging.level", defaults.logging.level)?
        .set_default("logging.format", defaults.logging.format)?
        .set_default("logging.output", defaults.logging.output)?)
}
