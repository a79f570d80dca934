//! stdio-context: Scoped Stdio Overrides
//!
//! Runs a task against substitute stdin/stdout/stderr streams, and a console
//! bound to them, for exactly the duration of the task. Contexts nest, may be
//! re-entered recursively, tolerate out-of-order exits, and restore every slot
//! they replaced once the task completes: on return, on panic, when a callback
//! first fires, or when a future settles.

pub mod config;
pub mod context;
pub mod environment;
pub mod error;
pub mod logging;
pub mod stream;

pub use config::{ContextDefaults, Settings};
pub use context::{
    Completion, ContextId, ContextOptions, ExitPolicy, GuardedCallback, OptionValue, Outcome,
    Scoped, StdioContext,
};
pub use environment::{Console, Descriptor, Environment, Slot, SlotValue};
pub use error::{ConfigurationError, ExitDisciplineError, StdioError};
pub use stream::{Capture, InputStream, OutputStream, StreamHandle};
