//! Environment variable source: TWINLINK_* prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

/// Add environment variable overlay to builder.
///
/// `TWINLINK__FEED__CHANGE_CAPACITY=64` sets `feed.change_capacity`.
pub(crate) fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("TWINLINK")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
