//! Error types for stdio contexts.

use crate::environment::Slot;
use thiserror::Error;

/// Bad constructor options or invalid settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Option {0} must be a boolean flag")]
    ExpectedFlag(String),

    #[error("Option {0} must be a stream or null")]
    ExpectedStream(String),

    #[error("Option {0} must be a readable stream")]
    NotReadable(Slot),

    #[error("Option {0} must be a writable stream")]
    NotWritable(Slot),

    #[error("Invalid settings: {0}")]
    Settings(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Misuse of `enter`/`exit` pairing, raised only by strict contexts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExitDisciplineError {
    #[error("Extra StdioContext exit(): context {0} has already exited completely")]
    ExtraExit(String),

    #[error("Mismatched StdioContext exit(): context {0} is not the current context")]
    MismatchedExit(String),

    #[error("{0} modified outside StdioContext")]
    ModifiedOutsideContext(Slot),
}

/// Any error raised by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StdioError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Exit discipline error: {0}")]
    ExitDiscipline(#[from] ExitDisciplineError),
}

impl From<config::ConfigError> for ConfigurationError {
    fn from(err: config::ConfigError) -> Self {
        ConfigurationError::Settings(err.to_string())
    }
}
