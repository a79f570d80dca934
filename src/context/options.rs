//! Context options: which slots to override and the exit policy.
//!
//! Options are a list of keyed entries so that callers can build them from
//! either names or positions. Stream keys accept `input`/`stdin`/`0`,
//! `output`/`stdout`/`1` and `error`/`stderr`/`2`; flag keys are `overwrite`
//! and `strict`. Later entries win.

use super::ExitPolicy;
use crate::config::ContextDefaults;
use crate::environment::Slot;
use crate::error::ConfigurationError;
use crate::stream::{Capture, InputStream, OutputStream, StreamHandle};

/// Value of one option entry.
#[derive(Debug, Clone)]
pub enum OptionValue {
    Stream(StreamHandle),
    /// For a stream key: install the placeholder stream.
    Null,
    Flag(bool),
}

impl From<StreamHandle> for OptionValue {
    fn from(stream: StreamHandle) -> Self {
        OptionValue::Stream(stream)
    }
}

impl From<InputStream> for OptionValue {
    fn from(stream: InputStream) -> Self {
        OptionValue::Stream(stream.into())
    }
}

impl From<OutputStream> for OptionValue {
    fn from(stream: OutputStream) -> Self {
        OptionValue::Stream(stream.into())
    }
}

impl From<&Capture> for OptionValue {
    fn from(capture: &Capture) -> Self {
        OptionValue::Stream(capture.into())
    }
}

impl From<bool> for OptionValue {
    fn from(flag: bool) -> Self {
        OptionValue::Flag(flag)
    }
}

impl<T: Into<StreamHandle>> From<Option<T>> for OptionValue {
    fn from(stream: Option<T>) -> Self {
        match stream {
            Some(stream) => OptionValue::Stream(stream.into()),
            None => OptionValue::Null,
        }
    }
}

/// Builder for [`StdioContext`](super::StdioContext) options.
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    entries: Vec<(String, OptionValue)>,
}

impl ContextOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options seeded with configured flag defaults.
    pub fn from_defaults(defaults: &ContextDefaults) -> Self {
        Self::new()
            .overwrite(defaults.overwrite)
            .strict(defaults.strict)
    }

    /// Streams by position: input, output, error. `None` leaves that slot
    /// alone; [`OptionValue::Null`] installs the placeholder.
    pub fn positional<I>(streams: I) -> Self
    where
        I: IntoIterator<Item = Option<OptionValue>>,
    {
        streams
            .into_iter()
            .enumerate()
            .fold(Self::new(), |options, (index, stream)| match stream {
                Some(value) => options.set(index.to_string(), value),
                None => options,
            })
    }

    /// Add a raw entry.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    pub fn input(self, stream: impl Into<StreamHandle>) -> Self {
        self.set("input", OptionValue::Stream(stream.into()))
    }

    pub fn output(self, stream: impl Into<StreamHandle>) -> Self {
        self.set("output", OptionValue::Stream(stream.into()))
    }

    pub fn error(self, stream: impl Into<StreamHandle>) -> Self {
        self.set("error", OptionValue::Stream(stream.into()))
    }

    /// Read from an empty source while entered.
    pub fn null_input(self) -> Self {
        self.set("input", OptionValue::Null)
    }

    /// Discard output while entered.
    pub fn null_output(self) -> Self {
        self.set("output", OptionValue::Null)
    }

    /// Discard error output while entered.
    pub fn null_error(self) -> Self {
        self.set("error", OptionValue::Null)
    }

    /// Restore on exit even if a slot was changed from outside.
    pub fn overwrite(self, overwrite: bool) -> Self {
        self.set("overwrite", overwrite)
    }

    /// Report exit misuse and outside changes as errors.
    pub fn strict(self, strict: bool) -> Self {
        self.set("strict", strict)
    }

    pub(crate) fn resolve(&self) -> Result<ResolvedOptions, ConfigurationError> {
        let mut resolved = ResolvedOptions::default();
        for (key, value) in &self.entries {
            match key.as_str() {
                "input" | "stdin" | "0" => resolved.input = input_setting(key, value)?,
                "output" | "stdout" | "1" => {
                    resolved.output = output_setting(Slot::Output, key, value)?
                }
                "error" | "stderr" | "2" => resolved.error = output_setting(Slot::Error, key, value)?,
                "overwrite" => resolved.policy.overwrite = flag(key, value)?,
                "strict" => resolved.policy.strict = flag(key, value)?,
                _ => return Err(ConfigurationError::UnknownOption(key.clone())),
            }
        }
        Ok(resolved)
    }
}

impl From<Vec<Option<OptionValue>>> for ContextOptions {
    fn from(streams: Vec<Option<OptionValue>>) -> Self {
        Self::positional(streams)
    }
}

/// How one stream slot is configured.
#[derive(Debug, Clone)]
pub(crate) enum Setting<T> {
    Omitted,
    Null,
    Stream(T),
}

impl<T: Clone> Setting<T> {
    /// The value to install, if any; `Null` builds a fresh placeholder.
    pub(crate) fn resolve(&self, placeholder: impl FnOnce() -> T) -> Option<T> {
        match self {
            Setting::Omitted => None,
            Setting::Null => Some(placeholder()),
            Setting::Stream(stream) => Some(stream.clone()),
        }
    }
}

impl<T> Default for Setting<T> {
    fn default() -> Self {
        Setting::Omitted
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ResolvedOptions {
    pub(crate) input: Setting<InputStream>,
    pub(crate) output: Setting<OutputStream>,
    pub(crate) error: Setting<OutputStream>,
    pub(crate) policy: ExitPolicy,
}

fn input_setting(key: &str, value: &OptionValue) -> Result<Setting<InputStream>, ConfigurationError> {
    match value {
        OptionValue::Null => Ok(Setting::Null),
        OptionValue::Stream(StreamHandle::Readable(stream)) => Ok(Setting::Stream(stream.clone())),
        OptionValue::Stream(StreamHandle::Writable(_)) => {
            Err(ConfigurationError::NotReadable(Slot::Input))
        }
        OptionValue::Flag(_) => Err(ConfigurationError::ExpectedStream(key.to_string())),
    }
}

fn output_setting(
    slot: Slot,
    key: &str,
    value: &OptionValue,
) -> Result<Setting<OutputStream>, ConfigurationError> {
    match value {
        OptionValue::Null => Ok(Setting::Null),
        OptionValue::Stream(StreamHandle::Writable(stream)) => Ok(Setting::Stream(stream.clone())),
        OptionValue::Stream(StreamHandle::Readable(_)) => Err(ConfigurationError::NotWritable(slot)),
        OptionValue::Flag(_) => Err(ConfigurationError::ExpectedStream(key.to_string())),
    }
}

fn flag(key: &str, value: &OptionValue) -> Result<bool, ConfigurationError> {
    match value {
        OptionValue::Flag(flag) => Ok(*flag),
        OptionValue::Null => Ok(false),
        OptionValue::Stream(_) => Err(ConfigurationError::ExpectedFlag(key.to_string())),
    }
}
