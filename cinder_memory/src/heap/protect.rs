use crate::object::Flags;
use crate::object::Instance;
use crate::value::InstanceId;
use crate::value::Value;
use super::Heap;

/// Methods for pinning instances the root scan cannot see.
///
/// All of these are total: immediates and stale references
/// are ignored, and the predicates report false for them.
impl Heap
{
    /// Set the transient mark bit.
    ///
    /// Called from mark callbacks on every child an instance holds.
    /// Outside a collection, this lets the instance survive
    /// exactly the next collection.
    pub fn mark(&self, value: Value)
    {
        let (id, slot) = match self.live_slot(value) {
            Ok(found) => found,
            Err(_) => return,
        };
        if slot.flags().contains(Flags::MARKED) {
            return;
        }
        slot.insert_flags(Flags::MARKED);
        if self.collector.is_marking() {
            self.collector.push_gray(id);
        }
    }

    /// Clear the transient mark bit.
    pub fn unmark(&self, value: Value)
    {
        self.update_flags(value, |slot| slot.remove_flags(Flags::MARKED));
    }

    /// Keep an instance alive until [`unprotect`][`Self::unprotect`].
    ///
    /// Protection nests: the instance stays protected
    /// until every `protect` has been matched by an `unprotect`.
    pub fn protect(&self, value: Value)
    {
        self.update_flags(value, |slot| {
            slot.protections.set(slot.protections.get().saturating_add(1));
            slot.insert_flags(Flags::PROTECTED);
        });
    }

    /// Undo one [`protect`][`Self::protect`].
    pub fn unprotect(&self, value: Value)
    {
        self.update_flags(value, |slot| {
            let protections = slot.protections.get().saturating_sub(1);
            slot.protections.set(protections);
            if protections == 0 {
                slot.remove_flags(Flags::PROTECTED);
            }
        });
    }

    /// Keep an instance alive for the rest of the heap's life.
    ///
    /// There is no way back.
    pub fn make_permanent(&self, value: Value)
    {
        self.update_flags(value, |slot| slot.insert_flags(Flags::PERMANENT));
    }

    /// Whether the transient mark bit is set.
    pub fn is_marked(&self, value: Value) -> bool
    {
        self.has_flags(value, Flags::MARKED)
    }

    /// Whether the instance is explicitly protected.
    pub fn is_protected(&self, value: Value) -> bool
    {
        self.has_flags(value, Flags::PROTECTED)
    }

    /// Whether the instance is permanent.
    pub fn is_permanent(&self, value: Value) -> bool
    {
        self.has_flags(value, Flags::PERMANENT)
    }

    /// Every protected instance, in pool order.
    pub fn protected_instances(&self) -> Vec<Value>
    {
        self.instances_with(Flags::PROTECTED)
    }

    /// Every permanent instance, in pool order.
    pub fn permanent_instances(&self) -> Vec<Value>
    {
        self.instances_with(Flags::PERMANENT)
    }

    fn update_flags(&self, value: Value, f: impl FnOnce(&Instance))
    {
        if let Ok((_, slot)) = self.live_slot(value) {
            f(&slot);
        }
    }

    fn has_flags(&self, value: Value, flags: Flags) -> bool
    {
        self.live_slot(value)
            .map(|(_, slot)| slot.flags().contains(flags))
            .unwrap_or(false)
    }

    fn instances_with(&self, flags: Flags) -> Vec<Value>
    {
        let mut found = Vec::new();
        self.pool.for_each(|index, slot| {
            if !slot.is_freed() && slot.flags().contains(flags) {
                let generation = slot.generation.get();
                found.push(Value::Ref(InstanceId{index, generation}));
            }
        });
        found
    }
}
