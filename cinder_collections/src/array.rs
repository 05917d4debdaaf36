//! Arrays: growable sequences of values indexed by integers.

use crate::inspect_all;
use crate::position;
use crate::visit::Visiting;

use cinder_memory::Heap;
use cinder_memory::Result;
use cinder_memory::Value;
use cinder_memory::types::Descriptor;
use std::rc::Rc;
use tracing::warn;

pub (crate) fn register(heap: &Heap, visiting: Rc<Visiting>) -> Descriptor
{
    let array = heap.register_type("array");

    let inspecting = visiting.clone();
    heap.install_inspect(array, move |heap, value| {
        inspecting.inspect(value, "[...]", || match items(heap, value) {
            Ok(items) => format!("[{}]", inspect_all(heap, &items)),
            Err(_) => String::from("[?]"),
        })
    });

    // An array is its own sequence.
    heap.install_to_sequence(array, |_, value| Ok(value));

    heap.install_copy(array, move |heap, value| {
        let items = items(heap, value)?;
        heap.allocate(heap.descriptor_of(value).unwrap_or(array), items)
    });

    heap.install_get(array, |heap, value, index| {
        heap.with_payload(value, |items: &Vec<Value>| {
            position(index, items.len()).map(|at| items[at])
        })?
    });

    // Storing one past the end appends.
    heap.install_set(array, |heap, value, index, item| {
        heap.with_payload_mut(value, |items: &mut Vec<Value>| -> Result<()> {
            if index == Value::Int(items.len() as i64) {
                items.push(item);
                return Ok(());
            }
            let at = position(index, items.len())?;
            items[at] = item;
            Ok(())
        })?
    });

    // Arrays that contain themselves compare equal
    // when nothing outside the cycle tells them apart.
    heap.install_equal(array, move |heap, value, other| {
        if value == other {
            return true;
        }
        if heap.descriptor_of(value) != heap.descriptor_of(other) {
            return false;
        }
        visiting.compare(value, other, || match (items(heap, value), items(heap, other)) {
            (Ok(a), Ok(b)) =>
                a.len() == b.len() && a.iter().zip(&b).all(|(&x, &y)| heap.equal(x, y)),
            _ => false,
        })
    });

    heap.install_length(array, |heap, value| {
        heap.with_payload(value, |items: &Vec<Value>| items.len()).unwrap_or(0)
    });

    heap.install_mark(array, |heap, value| {
        let traced = heap.with_payload(value, |items: &Vec<Value>| {
            for &item in items {
                heap.mark(item);
            }
        });
        if let Err(err) = traced {
            warn!(%value, %err, "array elements not traced");
        }
    });

    array
}

fn items(heap: &Heap, value: Value) -> Result<Vec<Value>>
{
    heap.with_payload(value, |items: &Vec<Value>| items.clone())
}
