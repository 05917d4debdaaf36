use crate::error::Error;
use crate::error::Result;
use crate::heap::Heap;
use crate::value::Value;

use core::any::Any;
use core::any::type_name;
use scopeguard::defer;

/// Methods for accessing payloads.
///
/// While a payload is borrowed, collections are refused,
/// so a collaborator may allocate from inside the closure
/// without its payload being traced or swept underneath it.
impl Heap
{
    /// Borrow the payload of an instance as a `T`.
    pub fn with_payload<T, R>(&self, value: Value, then: impl FnOnce(&T) -> R)
        -> Result<R>
        where T: Any
    {
        let (id, slot) = self.live_slot(value)?;
        let payload = slot.payload.try_borrow()
            .map_err(|_| Error::PayloadBorrowed(id))?;
        let payload = payload.as_ref()
            .and_then(|payload| payload.downcast_ref::<T>())
            .ok_or(Error::PayloadType{id, expected: type_name::<T>()})?;

        self.payload_borrows.set(self.payload_borrows.get() + 1);
        defer! { self.payload_borrows.set(self.payload_borrows.get() - 1); }

        Ok(then(payload))
    }

    /// Mutably borrow the payload of an instance as a `T`.
    ///
    /// The as-sequence cache is not invalidated automatically;
    /// call [`invalidate_sequence`][`Self::invalidate_sequence`]
    /// if the mutation changes what `to_sequence` would return.
    pub fn with_payload_mut<T, R>(&self, value: Value, then: impl FnOnce(&mut T) -> R)
        -> Result<R>
        where T: Any
    {
        let (id, slot) = self.live_slot(value)?;
        let mut payload = slot.payload.try_borrow_mut()
            .map_err(|_| Error::PayloadBorrowed(id))?;
        let payload = payload.as_mut()
            .and_then(|payload| payload.downcast_mut::<T>())
            .ok_or(Error::PayloadType{id, expected: type_name::<T>()})?;

        self.payload_borrows.set(self.payload_borrows.get() + 1);
        defer! { self.payload_borrows.set(self.payload_borrows.get() - 1); }

        Ok(then(payload))
    }

    /// Whether the payload of an instance is a `T`.
    pub fn payload_is<T>(&self, value: Value) -> bool
        where T: Any
    {
        match self.live_slot(value) {
            Ok((_, slot)) => slot.payload.try_borrow()
                .map(|payload| payload.as_ref().map_or(false, |p| p.is::<T>()))
                .unwrap_or(false),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn typed_access()
    {
        let heap = Heap::new();
        let counter = heap.register_type("counter");
        let value = heap.allocate(counter, 41i64).unwrap();
        heap.with_payload_mut(value, |n: &mut i64| *n += 1).unwrap();
        assert_eq!(heap.with_payload(value, |n: &i64| *n), Ok(42));
        assert!(heap.payload_is::<i64>(value));
        assert!(!heap.payload_is::<u8>(value));
    }

    #[test]
    fn wrong_type_is_reported()
    {
        let heap = Heap::new();
        let counter = heap.register_type("counter");
        let value = heap.allocate(counter, 1i64).unwrap();
        let id = value.as_instance().unwrap();
        assert_eq!(
            heap.with_payload(value, |_: &String| ()),
            Err(Error::PayloadType{id, expected: type_name::<String>()}),
        );
    }

    #[test]
    fn conflicting_borrow_is_reported()
    {
        let heap = Heap::new();
        let counter = heap.register_type("counter");
        let value = heap.allocate(counter, 1i64).unwrap();
        let id = value.as_instance().unwrap();
        let nested = heap.with_payload(value, |_: &i64| {
            heap.with_payload_mut(value, |n: &mut i64| *n = 2)
        });
        assert_eq!(nested, Ok(Err(Error::PayloadBorrowed(id))));
        assert_eq!(heap.payload_borrows.get(), 0);
    }

    #[test]
    fn immediates_and_stale_references_have_no_payload()
    {
        let heap = Heap::new();
        let counter = heap.register_type("counter");
        assert_eq!(
            heap.with_payload(Value::Int(1), |_: &i64| ()),
            Err(Error::NotAnInstance(Value::Int(1))),
        );
        let value = heap.allocate(counter, 1i64).unwrap();
        heap.collect();
        assert_eq!(
            heap.with_payload(value, |_: &i64| ()),
            Err(Error::Stale(value.as_instance().unwrap())),
        );
    }
}
