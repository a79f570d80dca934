//! Environment variable source: `STDIO_CONTEXT_DEFAULTS__STRICT=true` sets
//! `defaults.strict`, `STDIO_CONTEXT_LOGGING__LEVEL=debug` sets
//! `logging.level`.

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};

pub const PREFIX: &str = "STDIO_CONTEXT";

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    )
}
