//! Lists: arrays that print the way source code spells them.

use crate::inspect_all;
use crate::visit::Visiting;

use cinder_memory::Heap;
use cinder_memory::Result;
use cinder_memory::Value;
use cinder_memory::types::Descriptor;
use std::rc::Rc;

pub (crate) fn register(heap: &Heap, array: Descriptor, visiting: Rc<Visiting>)
    -> Result<Descriptor>
{
    let list = heap.derive_type("list", array)?;

    heap.install_inspect(list, move |heap, value| {
        visiting.inspect(value, "(...)", || {
            match heap.with_payload(value, |items: &Vec<Value>| items.clone()) {
                Ok(items) => format!("({})", inspect_all(heap, &items)),
                Err(_) => String::from("(?)"),
            }
        })
    });

    Ok(list)
}

#[cfg(test)]
mod tests
{
    use crate::Collections;

    use cinder_memory::Heap;
    use cinder_memory::Value;
    use cinder_memory::types::Behavior;

    #[test]
    fn behaves_like_an_array()
    {
        let heap = Heap::new();
        let types = Collections::register(&heap).unwrap();
        let list = types.list(&heap, vec![Value::Int(1), Value::Int(2)]).unwrap();

        assert_eq!(heap.inspect(list), "(1 2)");
        assert_eq!(heap.length(list), 2);
        assert_eq!(heap.get(list, Value::Int(0)), Ok(Value::Int(1)));

        let copy = heap.copy(list).unwrap();
        assert_eq!(heap.descriptor_of(copy), Some(types.list));
        assert!(heap.equal(list, copy));
    }

    #[test]
    fn overriding_does_not_leak_into_the_base()
    {
        let heap = Heap::new();
        let types = Collections::register(&heap).unwrap();
        let array = types.array(&heap, vec![Value::Int(1)]).unwrap();
        assert_eq!(heap.inspect(array), "[1]");

        let record = heap.type_descriptor(types.list).unwrap();
        assert_eq!(record.base, Some(types.array));
        assert!(record.has(Behavior::Mark));
    }

    #[test]
    fn elements_are_traced()
    {
        let heap = Heap::new();
        let types = Collections::register(&heap).unwrap();
        let element = types.string(&heap, "kept").unwrap();
        let list = types.list(&heap, vec![element]).unwrap();
        heap.push(list);
        assert_eq!(heap.collect(), 0);
        assert!(heap.contains(element));
    }
}
