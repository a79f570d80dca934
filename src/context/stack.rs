//! Context Stack
//!
//! Ordered record of the contexts entered on an environment. Entries are
//! pushed by `enter()` and only ever removed from the top. An `exit()` for a
//! context that is not on top marks its entry exited and leaves it in place;
//! it is unwound later, once everything above it has exited too.

use super::{ContextId, ExitPolicy};
use crate::environment::swap;
use crate::environment::{Descriptor, Slot, SlotTable, SlotValue};
use crate::error::ExitDisciplineError;
use std::collections::BTreeMap;
use tracing::debug;

/// Enter-time snapshot of one context.
pub(crate) struct ContextEntry {
    context: ContextId,
    policy: ExitPolicy,
    exited: bool,
    /// Descriptor present before this entry replaced the slot (`None`: slot
    /// was absent). A key exists only for slots this entry touched.
    before_enter: BTreeMap<Slot, Option<Descriptor>>,
    /// Descriptor this entry installed, used to detect outside changes.
    after_enter: BTreeMap<Slot, Descriptor>,
}

impl ContextEntry {
    pub(crate) fn new(context: ContextId, policy: ExitPolicy) -> Self {
        Self {
            context,
            policy,
            exited: false,
            before_enter: BTreeMap::new(),
            after_enter: BTreeMap::new(),
        }
    }

    /// Replace `slot` with `value`, recording the before and after descriptors.
    pub(crate) fn swap(&mut self, slots: &mut SlotTable, slot: Slot, value: SlotValue) {
        let previous = swap::replace_slot(slots, slot, value);
        self.before_enter.insert(slot, previous);
        if let Some(installed) = slots.descriptor(slot) {
            self.after_enter.insert(slot, installed.clone());
        }
    }

    pub(crate) fn touched(&self, slot: Slot) -> bool {
        self.before_enter.contains_key(&slot)
    }

    /// Put back every touched slot that was not changed from outside (or all
    /// of them under `overwrite`). Under `strict`, a slot changed from outside
    /// is left as is and reported once the remaining slots are restored.
    fn restore(self, slots: &mut SlotTable) -> Result<(), ExitDisciplineError> {
        let ContextEntry {
            context,
            policy,
            before_enter,
            after_enter,
            ..
        } = self;
        debug!(context = %context, "restoring stdio state");

        let mut modified = None;
        for (slot, previous) in before_enter {
            let unchanged = after_enter
                .get(&slot)
                .map_or(false, |installed| swap::descriptors_equal(slots, slot, installed));
            if policy.overwrite || unchanged {
                swap::restore_slot(slots, slot, previous);
            } else if policy.strict {
                modified.get_or_insert(slot);
            } else {
                debug!(context = %context, slot = %slot, "slot modified outside context, leaving it");
            }
        }

        match modified {
            Some(slot) => Err(ExitDisciplineError::ModifiedOutsideContext(slot)),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub(crate) struct ContextStack {
    entries: Vec<ContextEntry>,
}

impl ContextStack {
    pub(crate) fn push(&mut self, entry: ContextEntry) {
        self.entries.push(entry);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Exit the nearest entry owned by `context` and unwind every exited
    /// entry from the top.
    pub(crate) fn exit(
        &mut self,
        slots: &mut SlotTable,
        context: ContextId,
        policy: ExitPolicy,
    ) -> Result<(), ExitDisciplineError> {
        let Some(index) = self.entries.iter().rposition(|entry| entry.context == context) else {
            debug!(context = %context, "exit() on a context which has already exited completely");
            return if policy.strict {
                Err(ExitDisciplineError::ExtraExit(context.to_string()))
            } else {
                Ok(())
            };
        };

        self.entries[index].exited = true;

        if index + 1 != self.entries.len() {
            debug!(context = %context, depth = index, "exit() on a non-current context, deferring");
            return if policy.strict {
                Err(ExitDisciplineError::MismatchedExit(context.to_string()))
            } else {
                Ok(())
            };
        }

        while self.entries.last().map_or(false, |entry| entry.exited) {
            if let Some(entry) = self.entries.pop() {
                entry.restore(slots)?;
            }
        }
        Ok(())
    }
}
