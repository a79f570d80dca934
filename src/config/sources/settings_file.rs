//! Settings file source (TOML, or any format the `config` crate infers from
//! the extension).

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::Path;
use tracing::warn;

/// Add the settings file to the builder. A missing optional file is skipped
/// with a warning.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
    required: bool,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if !required && !path.exists() {
        warn!(config_path = %path.display(), "settings file not found, skipping");
        return Ok(builder);
    }
    Ok(builder.add_source(File::from(path).required(required)))
}
