//! Slot descriptors: the binding installed in a slot plus its attributes.

use super::SlotValue;
use std::fmt;
use std::sync::Arc;

/// Computes a slot's value on every read.
pub type Getter = Arc<dyn Fn() -> SlotValue + Send + Sync>;

/// Receives assignments to an accessor slot.
pub type Setter = Arc<dyn Fn(SlotValue) + Send + Sync>;

/// Getter/setter pair. Compared by closure identity.
///
/// Accessors run while the environment is locked and must not call back into
/// the [`Environment`](super::Environment) that owns them.
#[derive(Clone, Default)]
pub struct Accessor {
    pub get: Option<Getter>,
    pub set: Option<Setter>,
}

impl Accessor {
    pub fn getter(get: impl Fn() -> SlotValue + Send + Sync + 'static) -> Self {
        Self {
            get: Some(Arc::new(get)),
            set: None,
        }
    }

    pub fn with_setter(mut self, set: impl Fn(SlotValue) + Send + Sync + 'static) -> Self {
        self.set = Some(Arc::new(set));
        self
    }

    fn same(&self, other: &Accessor) -> bool {
        fn same_fn<T: ?Sized>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            }
        }
        same_fn(&self.get, &other.get) && same_fn(&self.set, &other.set)
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("get", &self.get.is_some())
            .field("set", &self.set.is_some())
            .finish()
    }
}

/// What a slot holds: a plain value or an accessor.
#[derive(Clone, Debug)]
pub enum Binding {
    Value(SlotValue),
    Accessor(Accessor),
}

/// Full description of a present slot.
#[derive(Clone, Debug)]
pub struct Descriptor {
    pub binding: Binding,
    pub enumerable: bool,
    /// Plain assignment replaces the value. Meaningless for accessors.
    pub writable: bool,
    pub configurable: bool,
}

impl Descriptor {
    /// A plain value that is enumerable, writable and configurable.
    pub fn value(value: SlotValue) -> Self {
        Self {
            binding: Binding::Value(value),
            enumerable: true,
            writable: true,
            configurable: true,
        }
    }

    /// An enumerable, configurable accessor.
    pub fn accessor(accessor: Accessor) -> Self {
        Self {
            binding: Binding::Accessor(accessor),
            enumerable: true,
            writable: false,
            configurable: true,
        }
    }

    pub fn enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = enumerable;
        self
    }

    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    pub fn configurable(mut self, configurable: bool) -> Self {
        self.configurable = configurable;
        self
    }

    pub fn has_setter(&self) -> bool {
        matches!(&self.binding, Binding::Accessor(accessor) if accessor.set.is_some())
    }

    /// Resolve the current value, running the getter if there is one.
    pub fn current(&self) -> Option<SlotValue> {
        match &self.binding {
            Binding::Value(value) => Some(value.clone()),
            Binding::Accessor(accessor) => accessor.get.as_ref().map(|get| get()),
        }
    }

    /// Structural equality: attributes by value, bindings by identity.
    pub fn same(&self, other: &Descriptor) -> bool {
        let bindings = match (&self.binding, &other.binding) {
            (Binding::Value(a), Binding::Value(b)) => a.same(b),
            (Binding::Accessor(a), Binding::Accessor(b)) => a.same(b),
            _ => false,
        };
        bindings
            && self.configurable == other.configurable
            && self.enumerable == other.enumerable
            && self.writable == other.writable
    }
}
