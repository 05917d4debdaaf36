use crate::error::Error;
use crate::error::Result;
use crate::heap::Heap;
use crate::value::Value;
use super::Behavior;
use super::Dispatch;

/// Generic operations, dispatched on the type of the receiver.
///
/// Each operation looks its behavior up in the receiver's descriptor
/// and falls back to a default when the type did not install one.
/// Immediates never consult the registry.
/// The callback handle is cloned out of the table before it runs,
/// so callbacks may install, register or allocate freely.
impl Heap
{
    /// Debugging representation of a value.
    ///
    /// Defaults to `#<type-name@index>`.
    pub fn inspect(&self, value: Value) -> String
    {
        match self.behavior(value, |d| d.inspect.clone()) {
            Ok(Some(inspect)) => inspect(self, value),
            Ok(None) => self.default_inspect(value),
            Err(_) => self.stale_inspect(value),
        }
    }

    /// User-facing representation of a value.
    ///
    /// Defaults to [`inspect`][`Self::inspect`].
    pub fn stringify(&self, value: Value) -> String
    {
        match self.behavior(value, |d| d.to_string.clone()) {
            Ok(Some(to_string)) => to_string(self, value),
            _ => self.inspect(value),
        }
    }

    /// Exhaustive representation of a value, for dumps.
    ///
    /// Defaults to [`inspect`][`Self::inspect`].
    pub fn dump(&self, value: Value) -> String
    {
        match self.behavior(value, |d| d.dump.clone()) {
            Ok(Some(dump)) => dump(self, value),
            _ => self.inspect(value),
        }
    }

    /// The value as a sequence, or nil if it is not one.
    ///
    /// The result is cached on the instance until
    /// [`invalidate_sequence`][`Self::invalidate_sequence`]
    /// or [`set`][`Self::set`] is called.
    pub fn to_sequence(&self, value: Value) -> Result<Value>
    {
        let to_sequence = match self.behavior(value, |d| d.to_sequence.clone())? {
            Some(to_sequence) => to_sequence,
            None => return Ok(Value::Nil),
        };

        let (_, slot) = self.live_slot(value)?;
        if !slot.sequence_dirty.get() {
            if let Some(cached) = slot.sequence.get() {
                return Ok(cached);
            }
        }

        // The callback may allocate, so both the receiver
        // and the result need a root until the result is cached.
        let sequence = self.with_frame(value, |heap| -> Result<Value> {
            let sequence = to_sequence(heap, value)?;
            heap.attach(sequence);
            Ok(sequence)
        })?;

        let (_, slot) = self.live_slot(value)?;
        slot.sequence.set(Some(sequence));
        slot.sequence_dirty.set(false);
        Ok(sequence)
    }

    /// A copy of the value.
    ///
    /// Defaults to the value itself.
    pub fn copy(&self, value: Value) -> Result<Value>
    {
        match self.behavior(value, |d| d.copy.clone())? {
            Some(copy) => copy(self, value),
            None => Ok(value),
        }
    }

    /// The element of `value` at `index`.
    ///
    /// Defaults to undefined.
    pub fn get(&self, value: Value, index: Value) -> Result<Value>
    {
        match self.behavior(value, |d| d.get.clone())? {
            Some(get) => get(self, value, index),
            None => Ok(Value::Undefined),
        }
    }

    /// Store `item` in `value` at `index`.
    ///
    /// Returns whether the type supports storing.
    /// Types without a set callback are left unchanged.
    pub fn set(&self, value: Value, index: Value, item: Value) -> Result<bool>
    {
        let set = match self.behavior(value, |d| d.set.clone())? {
            Some(set) => set,
            None => return Ok(false),
        };
        set(self, value, index, item)?;
        self.invalidate_sequence(value)?;
        Ok(true)
    }

    /// Whether two values are equal.
    ///
    /// The receiver's equal callback decides;
    /// without one, values are equal only when they are identical.
    pub fn equal(&self, value: Value, other: Value) -> bool
    {
        match self.behavior(value, |d| d.equal.clone()) {
            Ok(Some(equal)) => equal(self, value, other),
            _ => value == other,
        }
    }

    /// Number of elements in a value.
    ///
    /// Defaults to zero.
    pub fn length(&self, value: Value) -> usize
    {
        match self.behavior(value, |d| d.length.clone()) {
            Ok(Some(length)) => length(self, value),
            _ => 0,
        }
    }

    /// Execute a value against the operand stack.
    ///
    /// Callable instances run inside a protection frame
    /// whose caller is the instance itself;
    /// everything else is pushed onto the stack.
    pub fn call(&self, value: Value) -> Result<()>
    {
        match self.behavior(value, |d| d.call.clone())? {
            Some(call) => self.with_frame(value, |heap| call(heap, value)),
            None => {
                self.push(value);
                Ok(())
            },
        }
    }

    /// Whether the type of a value installed a behavior.
    ///
    /// Always false for immediates and stale references.
    pub fn has_behavior(&self, value: Value, behavior: Behavior) -> bool
    {
        self.descriptor_of(value)
            .and_then(|descriptor| self.registry.get(descriptor))
            .map_or(false, |record| record.has(behavior))
    }

    /// Pick one callback out of the receiver's dispatch table.
    ///
    /// Immediates have no table.
    /// Stale references are an error.
    fn behavior<F>(&self, value: Value, pick: impl FnOnce(&Dispatch) -> Option<F>)
        -> Result<Option<F>>
    {
        if value.is_immediate() {
            return Ok(None);
        }
        let (id, slot) = self.live_slot(value)?;
        let descriptor = slot.descriptor().ok_or(Error::Stale(id))?;
        let record = match self.registry.get(descriptor) {
            Some(record) => record,
            None => return Ok(None),
        };
        let dispatch = record.dispatch.borrow();
        Ok(pick(&dispatch))
    }

    fn default_inspect(&self, value: Value) -> String
    {
        match value.as_instance() {
            Some(id) => format!("#<{}@{}>", self.type_name(value), id.index),
            None => value.to_string(),
        }
    }

    fn stale_inspect(&self, value: Value) -> String
    {
        match value.as_instance() {
            Some(id) => format!("#<stale {}>", id),
            None => value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    use core::cell::Cell;
    use proptest::proptest;
    use std::rc::Rc;

    #[test]
    fn defaults_for_a_bare_type()
    {
        let heap = Heap::new();
        let thing = heap.register_type("thing");
        let value = heap.allocate(thing, ()).unwrap();
        let index = value.as_instance().unwrap().index;
        let expected = format!("#<thing@{}>", index);

        assert_eq!(heap.inspect(value), expected);
        assert_eq!(heap.stringify(value), expected);
        assert_eq!(heap.dump(value), expected);
        assert_eq!(heap.to_sequence(value), Ok(Value::Nil));
        assert_eq!(heap.copy(value), Ok(value));
        assert_eq!(heap.get(value, Value::Int(0)), Ok(Value::Undefined));
        assert_eq!(heap.set(value, Value::Int(0), Value::True), Ok(false));
        assert!(heap.equal(value, value));
        assert_eq!(heap.length(value), 0);

        assert_eq!(heap.call(value), Ok(()));
        assert_eq!(heap.pop(), Ok(value));
    }

    #[test]
    fn immediates_never_consult_the_registry()
    {
        let heap = Heap::new();
        assert_eq!(heap.inspect(Value::Int(42)), "42");
        assert_eq!(heap.stringify(Value::Nil), "nil");
        assert_eq!(heap.length(Value::True), 0);
        assert!(heap.equal(Value::Int(3), Value::Int(3)));
        assert!(!heap.equal(Value::Int(3), Value::Int(4)));
        assert_eq!(heap.copy(Value::False), Ok(Value::False));
        assert!(!heap.has_behavior(Value::Int(1), Behavior::Inspect));
        heap.call(Value::Undefined).unwrap();
        assert_eq!(heap.pop(), Ok(Value::Undefined));
    }

    #[test]
    fn stale_references()
    {
        let heap = Heap::new();
        let thing = heap.register_type("thing");
        let value = heap.allocate(thing, ()).unwrap();
        let id = value.as_instance().unwrap();
        heap.collect();

        assert_eq!(heap.inspect(value), format!("#<stale {}>", id));
        assert_eq!(heap.length(value), 0);
        assert_eq!(heap.get(value, Value::Int(0)), Err(Error::Stale(id)));
        assert_eq!(heap.call(value), Err(Error::Stale(id)));
        assert_eq!(heap.stack_depth(), 0);
    }

    #[test]
    fn installed_callbacks_take_over()
    {
        let heap = Heap::new();
        let cell = heap.register_type("cell");
        heap.install_inspect(cell, |heap, value| {
            let n = heap.with_payload(value, |n: &i64| *n).unwrap_or(0);
            format!("<cell {}>", n)
        });
        heap.install_to_string(cell, |_, _| String::from("cell"));
        heap.install_get(cell, |heap, value, _| {
            heap.with_payload(value, |n: &i64| Value::Int(*n))
        });
        heap.install_set(cell, |heap, value, _, item| {
            let item = item.as_int().ok_or(Error::Raised("not an integer".into()))?;
            heap.with_payload_mut(value, |n: &mut i64| *n = item)
        });
        heap.install_equal(cell, |heap, value, other| {
            heap.get(value, Value::Nil) == heap.get(other, Value::Nil)
        });
        heap.install_length(cell, |_, _| 1);

        let a = heap.allocate(cell, 1i64).unwrap();
        let b = heap.allocate(cell, 2i64).unwrap();
        assert_eq!(heap.inspect(a), "<cell 1>");
        assert_eq!(heap.stringify(a), "cell");
        assert_eq!(heap.dump(a), "<cell 1>");
        assert_eq!(heap.length(a), 1);
        assert!(!heap.equal(a, b));

        assert_eq!(heap.set(a, Value::Nil, Value::Int(2)), Ok(true));
        assert!(heap.equal(a, b));
        assert_eq!(
            heap.set(a, Value::Nil, Value::Nil),
            Err(Error::Raised("not an integer".into())),
        );
    }

    #[test]
    fn sequence_is_cached_until_invalidated()
    {
        let heap = Heap::new();
        let thing = heap.register_type("thing");
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        heap.install_to_sequence(thing, move |_, _| {
            counter.set(counter.get() + 1);
            Ok(Value::Int(counter.get()))
        });
        heap.install_set(thing, |_, _, _, _| Ok(()));

        let value = heap.allocate(thing, ()).unwrap();
        assert_eq!(heap.to_sequence(value), Ok(Value::Int(1)));
        assert_eq!(heap.to_sequence(value), Ok(Value::Int(1)));
        assert_eq!(calls.get(), 1);

        heap.invalidate_sequence(value).unwrap();
        assert_eq!(heap.to_sequence(value), Ok(Value::Int(2)));

        heap.set(value, Value::Int(0), Value::Int(0)).unwrap();
        assert_eq!(heap.to_sequence(value), Ok(Value::Int(3)));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn cached_sequence_is_kept_alive_by_its_owner()
    {
        let heap = Heap::new();
        let thing = heap.register_type("thing");
        let sequence = heap.register_type("sequence");
        heap.install_to_sequence(thing, move |heap, _| heap.allocate(sequence, ()));

        let value = heap.allocate(thing, ()).unwrap();
        heap.push(value);
        let cached = heap.to_sequence(value).unwrap();
        assert_eq!(heap.collect(), 0);
        assert!(heap.contains(cached));
    }

    #[test]
    fn call_runs_inside_a_frame()
    {
        let heap = Heap::new();
        let word = heap.register_type("word");
        let seen = Rc::new(Cell::new(None));
        let observer = seen.clone();
        heap.install_call(word, move |heap, value| {
            observer.set(Some((heap.frame_depth(), heap.frame_caller(0))));
            heap.push(value);
            heap.push(Value::Int(1));
            Ok(())
        });

        let value = heap.allocate(word, ()).unwrap();
        heap.call(value).unwrap();
        assert_eq!(seen.get(), Some((1, Some(value))));
        assert_eq!(heap.frame_depth(), 0);
        assert_eq!(heap.stack_values(), [value, Value::Int(1)]);
    }

    #[test]
    fn failing_call_still_pops_its_frame()
    {
        let heap = Heap::new();
        let word = heap.register_type("word");
        heap.install_call(word, |_, _| Err(Error::Raised("boom".into())));
        let value = heap.allocate(word, ()).unwrap();
        assert_eq!(heap.call(value), Err(Error::Raised("boom".into())));
        assert_eq!(heap.frame_depth(), 0);
    }

    #[test]
    fn derived_types_inherit_behavior()
    {
        let heap = Heap::new();
        let base = heap.register_type("base");
        heap.install_length(base, |_, _| 3);
        let derived = heap.derive_type("derived", base).unwrap();
        heap.install_length(derived, |_, _| 4);

        let b = heap.allocate(base, ()).unwrap();
        let d = heap.allocate(derived, ()).unwrap();
        assert_eq!(heap.length(b), 3);
        assert_eq!(heap.length(d), 4);
        assert!(heap.inspect(d).starts_with("#<derived@"));
        assert!(heap.has_behavior(d, Behavior::Length));
        assert!(!heap.has_behavior(d, Behavior::Inspect));
    }

    proptest!
    {
        #[test]
        fn missing_behavior_falls_back(
            installed in proptest::array::uniform4(proptest::bool::ANY),
            n in 0i64 .. 100,
        )
        {
            let heap = Heap::new();
            let thing = heap.register_type("thing");
            if installed[0] {
                heap.install_length(thing, |heap, value| {
                    heap.with_payload(value, |n: &i64| *n as usize).unwrap_or(0)
                });
            }
            if installed[1] {
                heap.install_get(thing, |_, _, index| Ok(index));
            }
            if installed[2] {
                heap.install_copy(thing, move |heap, value| {
                    let n = heap.with_payload(value, |n: &i64| *n)?;
                    heap.allocate(heap.descriptor_of(value).unwrap_or(thing), n)
                });
            }
            if installed[3] {
                heap.install_inspect(thing, |_, _| String::from("custom"));
            }

            let value = heap.allocate(thing, n).unwrap();

            let length = if installed[0] { n as usize } else { 0 };
            assert_eq!(heap.length(value), length);

            let got = if installed[1] { Value::Int(n) } else { Value::Undefined };
            assert_eq!(heap.get(value, Value::Int(n)), Ok(got));

            let copy = heap.copy(value).unwrap();
            assert_eq!(copy == value, !installed[2]);
            assert_eq!(heap.with_payload(copy, |m: &i64| *m), Ok(n));

            let inspected = heap.inspect(value);
            assert_eq!(inspected == "custom", installed[3]);
            assert_eq!(heap.stringify(value), inspected);
        }
    }
}
