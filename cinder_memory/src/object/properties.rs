use crate::error::Result;
use crate::heap::Heap;
use crate::value::Value;

/// Methods for the per-instance fields every header carries
/// next to its payload.
impl Heap
{
    /// Attach a property to an instance, replacing any previous one.
    ///
    /// Property values are traced by the collector.
    pub fn set_property(&self, value: Value, key: &str, item: Value) -> Result<()>
    {
        let (_, slot) = self.live_slot(value)?;
        let mut properties = slot.properties.borrow_mut();
        properties.get_or_insert_with(Default::default)
            .insert(key.to_owned(), item);
        Ok(())
    }

    /// The property with the given key, or undefined if there is none.
    pub fn property(&self, value: Value, key: &str) -> Result<Value>
    {
        let (_, slot) = self.live_slot(value)?;
        let properties = slot.properties.borrow();
        let found = properties.as_ref().and_then(|p| p.get(key)).copied();
        Ok(found.unwrap_or(Value::Undefined))
    }

    /// Detach a property, returning what it held.
    pub fn remove_property(&self, value: Value, key: &str) -> Result<Option<Value>>
    {
        let (_, slot) = self.live_slot(value)?;
        let mut properties = slot.properties.borrow_mut();
        Ok(properties.as_mut().and_then(|p| p.remove(key)))
    }

    /// Keys of every property, sorted.
    pub fn property_keys(&self, value: Value) -> Result<Vec<String>>
    {
        let (_, slot) = self.live_slot(value)?;
        let properties = slot.properties.borrow();
        let mut keys: Vec<String> = properties.iter()
            .flat_map(|p| p.keys().cloned())
            .collect();
        keys.sort_unstable();
        Ok(keys)
    }

    /// Attach a debugger hook to an instance.
    ///
    /// Passing nil removes the hook.
    pub fn set_debug_hook(&self, value: Value, hook: Value) -> Result<()>
    {
        let (_, slot) = self.live_slot(value)?;
        slot.debug_hook.set(if hook == Value::Nil { None } else { Some(hook) });
        Ok(())
    }

    /// The debugger hook attached to an instance, if any.
    pub fn debug_hook(&self, value: Value) -> Result<Option<Value>>
    {
        let (_, slot) = self.live_slot(value)?;
        Ok(slot.debug_hook.get())
    }

    /// Position of the cyclic cursor, advancing it.
    ///
    /// The cursor wraps around at `len`.
    /// With `len` zero the cursor stays at zero.
    pub fn next_cursor(&self, value: Value, len: usize) -> Result<usize>
    {
        let (_, slot) = self.live_slot(value)?;
        if len == 0 {
            slot.cursor.set(0);
            return Ok(0);
        }
        let position = slot.cursor.get() % len;
        slot.cursor.set((position + 1) % len);
        Ok(position)
    }

    /// Move the cyclic cursor back to the start.
    pub fn reset_cursor(&self, value: Value) -> Result<()>
    {
        let (_, slot) = self.live_slot(value)?;
        slot.cursor.set(0);
        Ok(())
    }

    /// Forget the cached result of `to_sequence`.
    ///
    /// Types whose payload can be mutated in place
    /// call this after every mutation.
    pub fn invalidate_sequence(&self, value: Value) -> Result<()>
    {
        let (_, slot) = self.live_slot(value)?;
        slot.sequence_dirty.set(true);
        Ok(())
    }
}

#[cfg(test)]
mod tests
{
    use crate::error::Error;
    use super::*;

    #[test]
    fn properties()
    {
        let heap = Heap::new();
        let thing = heap.register_type("thing");
        let value = heap.allocate(thing, ()).unwrap();
        assert_eq!(heap.property(value, "name"), Ok(Value::Undefined));
        assert_eq!(heap.property_keys(value), Ok(vec![]));

        heap.set_property(value, "b", Value::Int(2)).unwrap();
        heap.set_property(value, "a", Value::Int(1)).unwrap();
        heap.set_property(value, "b", Value::Int(3)).unwrap();
        assert_eq!(heap.property(value, "b"), Ok(Value::Int(3)));
        assert_eq!(heap.property_keys(value), Ok(vec!["a".into(), "b".into()]));

        assert_eq!(heap.remove_property(value, "a"), Ok(Some(Value::Int(1))));
        assert_eq!(heap.remove_property(value, "a"), Ok(None));
    }

    #[test]
    fn property_values_are_traced()
    {
        let heap = Heap::new();
        let thing = heap.register_type("thing");
        let owner = heap.allocate(thing, ()).unwrap();
        let held = heap.allocate(thing, ()).unwrap();
        heap.set_property(owner, "held", held).unwrap();
        heap.push(owner);
        assert_eq!(heap.collect(), 0);
        assert!(heap.contains(held));

        heap.remove_property(owner, "held").unwrap();
        assert_eq!(heap.collect(), 1);
        assert!(!heap.contains(held));
    }

    #[test]
    fn debug_hook_is_cleared_by_nil()
    {
        let heap = Heap::new();
        let thing = heap.register_type("thing");
        let value = heap.allocate(thing, ()).unwrap();
        heap.set_debug_hook(value, Value::Int(7)).unwrap();
        assert_eq!(heap.debug_hook(value), Ok(Some(Value::Int(7))));
        heap.set_debug_hook(value, Value::Nil).unwrap();
        assert_eq!(heap.debug_hook(value), Ok(None));
    }

    #[test]
    fn cursor_cycles()
    {
        let heap = Heap::new();
        let thing = heap.register_type("thing");
        let value = heap.allocate(thing, ()).unwrap();
        let seen: Vec<_> = (0 .. 7)
            .map(|_| heap.next_cursor(value, 3).unwrap())
            .collect();
        assert_eq!(seen, [0, 1, 2, 0, 1, 2, 0]);
        heap.reset_cursor(value).unwrap();
        assert_eq!(heap.next_cursor(value, 3), Ok(0));
        assert_eq!(heap.next_cursor(value, 0), Ok(0));
    }

    #[test]
    fn immediates_have_no_header()
    {
        let heap = Heap::new();
        assert_eq!(
            heap.set_property(Value::True, "x", Value::Nil),
            Err(Error::NotAnInstance(Value::True)),
        );
        assert_eq!(
            heap.next_cursor(Value::Int(0), 1),
            Err(Error::NotAnInstance(Value::Int(0))),
        );
    }
}
