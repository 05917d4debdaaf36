//! Immutable strings.
//!
//! Strings have no set callback, so storing into one
//! leaves it unchanged and reports that nothing was stored.

use crate::position;

use cinder_memory::Heap;
use cinder_memory::Result;
use cinder_memory::Value;
use cinder_memory::types::Descriptor;

/// Register the string type.
///
/// `array` is the type `to_sequence` produces.
pub (crate) fn register(heap: &Heap, array: Descriptor) -> Descriptor
{
    let string = heap.register_type("string");

    heap.install_inspect(string, |heap, value| {
        heap.with_payload(value, |text: &String| format!("{:?}", text))
            .unwrap_or_else(|_| String::from("\"?\""))
    });

    heap.install_to_string(string, |heap, value| {
        heap.with_payload(value, String::clone).unwrap_or_default()
    });

    heap.install_to_sequence(string, move |heap, value| {
        let codes = heap.with_payload(value, |text: &String| {
            text.chars().map(|c| Value::Int(c as i64)).collect::<Vec<_>>()
        })?;
        heap.allocate(array, codes)
    });

    heap.install_copy(string, move |heap, value| {
        let text = text(heap, value)?;
        heap.allocate(string, text)
    });

    heap.install_get(string, |heap, value, index| {
        let text = text(heap, value)?;
        let at = position(index, text.chars().count())?;
        Ok(text.chars().nth(at).map_or(Value::Undefined, |c| Value::Int(c as i64)))
    });

    heap.install_equal(string, |heap, value, other| {
        match (text(heap, value), text(heap, other)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    });

    heap.install_length(string, |heap, value| {
        heap.with_payload(value, |text: &String| text.chars().count()).unwrap_or(0)
    });

    string
}

fn text(heap: &Heap, value: Value) -> Result<String>
{
    heap.with_payload(value, String::clone)
}

#[cfg(test)]
mod tests
{
    use crate::Collections;

    use cinder_memory::Heap;
    use cinder_memory::Value;

    #[test]
    fn representations()
    {
        let heap = Heap::new();
        let types = Collections::register(&heap).unwrap();
        let string = types.string(&heap, "say \"hi\"").unwrap();
        assert_eq!(heap.inspect(string), r#""say \"hi\"""#);
        assert_eq!(heap.stringify(string), "say \"hi\"");
        assert_eq!(heap.dump(string), heap.inspect(string));
    }

    #[test]
    fn characters()
    {
        let heap = Heap::new();
        let types = Collections::register(&heap).unwrap();
        let string = types.string(&heap, "añb").unwrap();
        assert_eq!(heap.length(string), 3);
        assert_eq!(heap.get(string, Value::Int(1)), Ok(Value::Int('ñ' as i64)));
        assert_eq!(heap.set(string, Value::Int(0), Value::Int(0)), Ok(false));
        assert_eq!(heap.stringify(string), "añb");
    }

    #[test]
    fn equality_is_by_content()
    {
        let heap = Heap::new();
        let types = Collections::register(&heap).unwrap();
        let a = types.string(&heap, "x").unwrap();
        let b = heap.copy(a).unwrap();
        let c = types.string(&heap, "y").unwrap();
        assert_ne!(a, b);
        assert!(heap.equal(a, b));
        assert!(!heap.equal(a, c));
        assert!(!heap.equal(a, Value::Int('x' as i64)));
    }

    #[test]
    fn sequence_is_cached_and_traced()
    {
        let heap = Heap::new();
        let types = Collections::register(&heap).unwrap();
        let string = types.string(&heap, "ab").unwrap();
        heap.push(string);

        let codes = heap.to_sequence(string).unwrap();
        assert_eq!(heap.descriptor_of(codes), Some(types.array));
        assert_eq!(heap.inspect(codes), "[97 98]");
        assert_eq!(heap.to_sequence(string), Ok(codes));

        assert_eq!(heap.collect(), 0);
        assert!(heap.contains(codes));
    }
}
