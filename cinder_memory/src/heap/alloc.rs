use crate::error::Error;
use crate::error::Result;
use crate::object::Payload;
use crate::types::Descriptor;
use crate::value::InstanceId;
use crate::value::Value;
use super::Heap;

use core::any::Any;

impl Heap
{
    /// Create an instance of a type around a payload.
    ///
    /// The payload is owned by the instance from now on;
    /// the type gets it back through its free callback
    /// once the instance is swept.
    ///
    /// The new instance is live, unprotected and not permanent,
    /// and attached to the innermost protection frame, if any.
    /// Allocation may run a collection first
    /// when the live instance count has reached the high-water mark.
    pub fn allocate<T>(&self, descriptor: Descriptor, payload: T) -> Result<Value>
        where T: Any
    {
        self.allocate_boxed(descriptor, Box::new(payload))
    }

    /// Like [`allocate`][`Self::allocate`], for an already boxed payload.
    pub fn allocate_boxed(&self, descriptor: Descriptor, payload: Payload)
        -> Result<Value>
    {
        if descriptor.index() >= self.registry.len() {
            return Err(Error::UnknownDescriptor(descriptor));
        }

        self.collect_if_needed();

        let (index, slot) = self.pool.take();
        let generation = slot.occupy(descriptor, payload);
        self.pool.inc_live();
        self.collector.record_allocation();

        let id = InstanceId{index, generation};
        self.frames.attach(id);

        // Allocated by a mark callback; must survive this cycle.
        if self.collector.is_marking() {
            self.mark(Value::Ref(id));
        }

        Ok(Value::Ref(id))
    }
}
