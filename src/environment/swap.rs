//! Attribute-preserving save/replace/restore for a single slot.

use super::{Binding, Descriptor, Slot, SlotTable, SlotValue};

/// Install `value` in `slot`, keeping the previous enumerability and leaving the
/// slot writable if it was writable or had a setter. Returns the previous
/// descriptor unmodified (`None` if the slot was absent).
pub(crate) fn replace_slot(table: &mut SlotTable, slot: Slot, value: SlotValue) -> Option<Descriptor> {
    let previous = table.descriptor(slot).cloned();
    let (enumerable, writable) = match &previous {
        Some(prev) => (prev.enumerable, prev.writable || prev.has_setter()),
        None => (true, true),
    };
    table.define(
        slot,
        Some(Descriptor {
            binding: Binding::Value(value),
            enumerable,
            writable,
            configurable: true,
        }),
    );
    previous
}

/// Whether `slot` still holds exactly `descriptor`.
pub(crate) fn descriptors_equal(table: &SlotTable, slot: Slot, descriptor: &Descriptor) -> bool {
    table
        .descriptor(slot)
        .map_or(false, |current| current.same(descriptor))
}

/// Reinstall a descriptor captured by [`replace_slot`].
pub(crate) fn restore_slot(table: &mut SlotTable, slot: Slot, previous: Option<Descriptor>) {
    table.define(slot, previous);
}
