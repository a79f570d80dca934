//! Stdio Contexts
//!
//! A [`StdioContext`] describes which stdio slots to override and with what.
//! `enter()` installs the overrides on its environment and pushes an entry on
//! that environment's context stack; `exit()` unwinds it. The `wrap*` and
//! `exec*` helpers in [`completion`] bracket a function call with the pair.

pub mod completion;
pub mod options;
pub(crate) mod stack;

pub use completion::{Completion, GuardedCallback, Outcome, Scoped};
pub use options::{ContextOptions, OptionValue};

use crate::environment::{Console, EnvState, Environment, Slot, SlotValue};
use crate::error::{ConfigurationError, ExitDisciplineError};
use crate::stream::{InputStream, OutputStream};
use options::ResolvedOptions;
use stack::ContextEntry;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Diagnostic ordinal identifying a context and all of its clones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        ContextId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

/// What happens when a context exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExitPolicy {
    /// Restore slots even if they were changed from outside the context.
    pub overwrite: bool,
    /// Raise [`ExitDisciplineError`] for extra exits, out-of-order exits and
    /// slots changed from outside.
    pub strict: bool,
}

/// A configured stdio override scope.
///
/// Clones share identity: entering one clone and exiting another is a matched
/// pair.
#[derive(Clone)]
pub struct StdioContext {
    id: ContextId,
    options: Arc<ResolvedOptions>,
    env: Environment,
}

impl StdioContext {
    /// Create a context on the process environment.
    pub fn new(options: impl Into<ContextOptions>) -> Result<Self, ConfigurationError> {
        Self::with_environment(&Environment::process(), options)
    }

    /// Create a context on `env`.
    pub fn with_environment(
        env: &Environment,
        options: impl Into<ContextOptions>,
    ) -> Result<Self, ConfigurationError> {
        let options = options.into().resolve()?;
        Ok(Self {
            id: ContextId::next(),
            options: Arc::new(options),
            env: env.clone(),
        })
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn policy(&self) -> ExitPolicy {
        self.options.policy
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Install this context's streams and push an entry for it.
    ///
    /// Slots configured as null get a fresh placeholder on every call. If the
    /// output or error slot is replaced, the console is rebuilt on top of the
    /// now-current pair.
    pub fn enter(&self) {
        debug!(context = %self.id, policy = ?self.options.policy, "enter()");
        let input = self.options.input.resolve(InputStream::empty);
        let output = self.options.output.resolve(OutputStream::discard);
        let error = self.options.error.resolve(OutputStream::discard);

        let mut state = self.env.lock();
        let EnvState { slots, stack } = &mut *state;
        let mut entry = ContextEntry::new(self.id, self.options.policy);

        if let Some(input) = input {
            entry.swap(slots, Slot::Input, SlotValue::Input(input));
        }
        if let Some(output) = output {
            entry.swap(slots, Slot::Output, SlotValue::Output(output));
        }
        if let Some(error) = error {
            entry.swap(slots, Slot::Error, SlotValue::Output(error));
        }

        if entry.touched(Slot::Output) || entry.touched(Slot::Error) {
            let console = Console::new(
                slots.output_or_discard(Slot::Output),
                slots.output_or_discard(Slot::Error),
            );
            entry.swap(slots, Slot::LogFacade, console.into());
        }

        stack.push(entry);
    }

    /// Exit this context, restoring the slots it replaced once every context
    /// entered after it has exited as well.
    pub fn exit(&self) -> Result<(), ExitDisciplineError> {
        debug!(context = %self.id, "exit()");
        let mut state = self.env.lock();
        let EnvState { slots, stack } = &mut *state;
        stack.exit(slots, self.id, self.options.policy)
    }
}

impl fmt::Debug for StdioContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdioContext")
            .field("id", &self.id.to_string())
            .field("policy", &self.options.policy)
            .finish_non_exhaustive()
    }
}
