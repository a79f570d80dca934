//! Environment
//!
//! The four stdio slots (input, output, error and the console facade) and the
//! stack of contexts currently overriding them. Code that wants its stdio to be
//! substitutable reads and writes through an [`Environment`] rather than the
//! process handles directly. [`Environment::process`] binds the real process
//! streams once, lazily, and is what [`StdioContext::new`](crate::StdioContext::new)
//! uses; other environments are independent and mostly useful in tests.

mod console;
mod descriptor;
pub(crate) mod swap;

pub use console::Console;
pub use descriptor::{Accessor, Binding, Descriptor, Getter, Setter};

use crate::context::stack::ContextStack;
use crate::stream::{InputStream, OutputStream};
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::io;
use std::sync::{Arc, OnceLock};

/// One of the tracked global bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    Input,
    Output,
    Error,
    /// Derived from output and error whenever a context replaces either.
    LogFacade,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Slot::Input, Slot::Output, Slot::Error, Slot::LogFacade];

    pub fn name(self) -> &'static str {
        match self {
            Slot::Input => "input",
            Slot::Output => "output",
            Slot::Error => "error",
            Slot::LogFacade => "log_facade",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value held by a slot.
#[derive(Clone, Debug)]
pub enum SlotValue {
    Input(InputStream),
    Output(OutputStream),
    Console(Arc<Console>),
}

impl SlotValue {
    /// Identity comparison.
    pub fn same(&self, other: &SlotValue) -> bool {
        match (self, other) {
            (SlotValue::Input(a), SlotValue::Input(b)) => InputStream::ptr_eq(a, b),
            (SlotValue::Output(a), SlotValue::Output(b)) => OutputStream::ptr_eq(a, b),
            (SlotValue::Console(a), SlotValue::Console(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn into_input(self) -> Option<InputStream> {
        match self {
            SlotValue::Input(stream) => Some(stream),
            _ => None,
        }
    }

    pub fn into_output(self) -> Option<OutputStream> {
        match self {
            SlotValue::Output(stream) => Some(stream),
            _ => None,
        }
    }

    pub fn into_console(self) -> Option<Arc<Console>> {
        match self {
            SlotValue::Console(console) => Some(console),
            _ => None,
        }
    }
}

impl From<InputStream> for SlotValue {
    fn from(stream: InputStream) -> Self {
        SlotValue::Input(stream)
    }
}

impl From<OutputStream> for SlotValue {
    fn from(stream: OutputStream) -> Self {
        SlotValue::Output(stream)
    }
}

impl From<Console> for SlotValue {
    fn from(console: Console) -> Self {
        SlotValue::Console(Arc::new(console))
    }
}

/// Descriptors for the four slots. `None` means the slot is absent.
#[derive(Default)]
pub(crate) struct SlotTable {
    slots: [Option<Descriptor>; 4],
}

impl SlotTable {
    pub(crate) fn descriptor(&self, slot: Slot) -> Option<&Descriptor> {
        self.slots[slot.index()].as_ref()
    }

    pub(crate) fn define(&mut self, slot: Slot, descriptor: Option<Descriptor>) -> Option<Descriptor> {
        std::mem::replace(&mut self.slots[slot.index()], descriptor)
    }

    pub(crate) fn get(&self, slot: Slot) -> Option<SlotValue> {
        self.descriptor(slot).and_then(Descriptor::current)
    }

    /// Plain assignment: writable values are replaced, setters are called,
    /// anything else is left alone. Returns whether the assignment took effect.
    pub(crate) fn assign(&mut self, slot: Slot, value: SlotValue) -> bool {
        let Some(descriptor) = self.slots[slot.index()].as_mut() else {
            self.slots[slot.index()] = Some(Descriptor::value(value));
            return true;
        };
        if let Binding::Accessor(accessor) = &descriptor.binding {
            return match &accessor.set {
                Some(set) => {
                    set(value);
                    true
                }
                None => false,
            };
        }
        if descriptor.writable {
            descriptor.binding = Binding::Value(value);
            true
        } else {
            false
        }
    }

    /// Current output stream, or a discard sink if the slot is absent or holds
    /// something else.
    pub(crate) fn output_or_discard(&self, slot: Slot) -> OutputStream {
        self.get(slot)
            .and_then(SlotValue::into_output)
            .unwrap_or_else(OutputStream::discard)
    }
}

pub(crate) struct EnvState {
    pub(crate) slots: SlotTable,
    pub(crate) stack: ContextStack,
}

/// Shared handle to a set of stdio slots and their context stack.
#[derive(Clone)]
pub struct Environment {
    state: Arc<Mutex<EnvState>>,
}

impl Environment {
    /// An environment with every slot absent.
    pub fn new() -> Self {
        Self::from_table(SlotTable::default())
    }

    /// An environment holding the given streams as plain values, with a
    /// console bound to `output` and `error`.
    pub fn with_streams(input: InputStream, output: OutputStream, error: OutputStream) -> Self {
        let mut slots = SlotTable::default();
        let console = Console::new(output.clone(), error.clone());
        slots.define(Slot::Input, Some(Descriptor::value(input.into())));
        slots.define(Slot::Output, Some(Descriptor::value(output.into())));
        slots.define(Slot::Error, Some(Descriptor::value(error.into())));
        slots.define(Slot::LogFacade, Some(Descriptor::value(console.into())));
        Self::from_table(slots)
    }

    /// The process-wide environment bound to the real stdin, stdout and
    /// stderr. Each slot is an accessor that opens its stream on first read.
    pub fn process() -> Environment {
        static PROCESS: OnceLock<Environment> = OnceLock::new();
        PROCESS.get_or_init(process_environment).clone()
    }

    fn from_table(slots: SlotTable) -> Self {
        Self {
            state: Arc::new(Mutex::new(EnvState {
                slots,
                stack: ContextStack::default(),
            })),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, EnvState> {
        self.state.lock()
    }

    pub fn get(&self, slot: Slot) -> Option<SlotValue> {
        self.lock().slots.get(slot)
    }

    pub fn input(&self) -> Option<InputStream> {
        self.get(Slot::Input).and_then(SlotValue::into_input)
    }

    pub fn output(&self) -> Option<OutputStream> {
        self.get(Slot::Output).and_then(SlotValue::into_output)
    }

    pub fn error(&self) -> Option<OutputStream> {
        self.get(Slot::Error).and_then(SlotValue::into_output)
    }

    pub fn console(&self) -> Option<Arc<Console>> {
        self.get(Slot::LogFacade).and_then(SlotValue::into_console)
    }

    /// Assign a new value the way ordinary code would: read-only slots ignore
    /// the assignment and accessor slots forward it to their setter.
    pub fn assign(&self, slot: Slot, value: impl Into<SlotValue>) -> bool {
        self.lock().slots.assign(slot, value.into())
    }

    pub fn descriptor(&self, slot: Slot) -> Option<Descriptor> {
        self.lock().slots.descriptor(slot).cloned()
    }

    /// Install a descriptor unconditionally, returning the one it replaced.
    pub fn define(&self, slot: Slot, descriptor: Descriptor) -> Option<Descriptor> {
        self.lock().slots.define(slot, Some(descriptor))
    }

    pub fn remove(&self, slot: Slot) -> Option<Descriptor> {
        self.lock().slots.define(slot, None)
    }

    /// Number of contexts entered and not yet unwound.
    pub fn depth(&self) -> usize {
        self.lock().stack.len()
    }

    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.state, &b.state)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("depth", &self.depth())
            .finish_non_exhaustive()
    }
}

fn process_environment() -> Environment {
    let stdout: Arc<OnceLock<OutputStream>> = Arc::new(OnceLock::new());
    let stderr: Arc<OnceLock<OutputStream>> = Arc::new(OnceLock::new());
    let stdin: Arc<OnceLock<InputStream>> = Arc::new(OnceLock::new());
    let console: Arc<OnceLock<Arc<Console>>> = Arc::new(OnceLock::new());

    let open_stdout = {
        let cell = stdout.clone();
        move || cell.get_or_init(|| OutputStream::labeled("stdout", io::stdout())).clone()
    };
    let open_stderr = {
        let cell = stderr.clone();
        move || cell.get_or_init(|| OutputStream::labeled("stderr", io::stderr())).clone()
    };

    let mut slots = SlotTable::default();
    slots.define(
        Slot::Input,
        Some(Descriptor::accessor(Accessor::getter(move || {
            SlotValue::Input(stdin.get_or_init(|| InputStream::labeled("stdin", io::stdin())).clone())
        }))),
    );
    slots.define(
        Slot::Output,
        Some(Descriptor::accessor(Accessor::getter({
            let open = open_stdout.clone();
            move || SlotValue::Output(open())
        }))),
    );
    slots.define(
        Slot::Error,
        Some(Descriptor::accessor(Accessor::getter({
            let open = open_stderr.clone();
            move || SlotValue::Output(open())
        }))),
    );
    slots.define(
        Slot::LogFacade,
        Some(Descriptor::accessor(Accessor::getter(move || {
            SlotValue::Console(
                console
                    .get_or_init(|| Arc::new(Console::new(open_stdout(), open_stderr())))
                    .clone(),
            )
        }))),
    );
    Environment::from_table(slots)
}
