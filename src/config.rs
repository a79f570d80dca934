//! Configuration System
//!
//! Layered settings for applications embedding stdio contexts: built-in
//! defaults, then an optional TOML file, then `STDIO_CONTEXT_*` environment
//! variables. Settings only seed defaults; options passed to a context always
//! win.

use crate::error::ConfigurationError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod merge;
mod sources;

/// Default exit policy for contexts built with
/// [`ContextOptions::from_defaults`](crate::ContextOptions::from_defaults).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextDefaults {
    #[serde(default)]
    pub overwrite: bool,

    #[serde(default)]
    pub strict: bool,
}

/// Root settings structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub defaults: ContextDefaults,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Settings {
    /// Load settings from the file named by `STDIO_CONTEXT_CONFIG` (if any)
    /// and the environment.
    pub fn load() -> Result<Self, ConfigurationError> {
        let file = std::env::var_os(sources::CONFIG_PATH_VAR);
        Self::load_layers(file.as_deref().map(Path::new), false)
    }

    /// Load settings from `path` (which must exist) and the environment.
    pub fn load_from(path: &Path) -> Result<Self, ConfigurationError> {
        Self::load_layers(Some(path), true)
    }

    fn load_layers(file: Option<&Path>, required: bool) -> Result<Self, ConfigurationError> {
        let mut builder = merge::builder_with_defaults()?;
        if let Some(path) = file {
            builder = sources::settings_file::add_to_builder(builder, path, required)?;
        }
        builder = sources::environment::add_to_builder(builder);

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.logging.validate()
    }
}
