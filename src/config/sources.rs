//! Settings sources layered over the defaults.

pub mod environment;
pub mod settings_file;

/// Environment variable naming a settings file for [`Settings::load`](super::Settings::load).
pub const CONFIG_PATH_VAR: &str = "STDIO_CONTEXT_CONFIG";
