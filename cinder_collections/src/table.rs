//! Tables: association lists keyed by arbitrary values.
//!
//! Keys are compared with [`Heap::equal`],
//! so two distinct strings with the same text find the same entry.

use crate::inspect_all;
use crate::visit::Visiting;

use cinder_memory::Heap;
use cinder_memory::Result;
use cinder_memory::Value;
use cinder_memory::types::Descriptor;
use std::rc::Rc;
use tracing::warn;

/// Payload of a table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table
{
    /// Key and value pairs, in insertion order.
    pub entries: Vec<(Value, Value)>,
}

impl Table
{
    /// Position of the entry whose key equals `key`.
    pub fn find(&self, heap: &Heap, key: Value) -> Option<usize>
    {
        self.entries.iter().position(|&(k, _)| heap.equal(k, key))
    }

    /// Every key, in insertion order.
    pub fn keys(&self) -> Vec<Value>
    {
        self.entries.iter().map(|&(k, _)| k).collect()
    }
}

/// Register the table type.
///
/// `array` is the type `to_sequence` produces.
pub (crate) fn register(heap: &Heap, array: Descriptor, visiting: Rc<Visiting>)
    -> Descriptor
{
    let table = heap.register_type("table");

    heap.install_inspect(table, move |heap, value| {
        visiting.inspect(value, "{...}", || {
            let entries = match snapshot(heap, value) {
                Ok(table) => table.entries,
                Err(_) => return String::from("{?}"),
            };
            let entries: Vec<String> = entries.iter()
                .map(|&(k, v)| inspect_all(heap, &[k, v]))
                .collect();
            format!("{{{}}}", entries.join(", "))
        })
    });

    heap.install_to_sequence(table, move |heap, value| {
        let keys = snapshot(heap, value)?.keys();
        heap.allocate(array, keys)
    });

    heap.install_copy(table, move |heap, value| {
        let copy = snapshot(heap, value)?;
        heap.allocate(table, copy)
    });

    heap.install_get(table, |heap, value, key| {
        let table = snapshot(heap, value)?;
        Ok(table.find(heap, key).map_or(Value::Undefined, |at| table.entries[at].1))
    });

    // Keys are compared before the payload is borrowed mutably,
    // as comparing may need to look at the table itself.
    heap.install_set(table, |heap, value, key, item| {
        let found = snapshot(heap, value)?.find(heap, key);
        heap.with_payload_mut(value, |table: &mut Table| {
            match found.and_then(|at| table.entries.get_mut(at)) {
                Some(entry) => entry.1 = item,
                None => table.entries.push((key, item)),
            }
        })
    });

    heap.install_length(table, |heap, value| {
        heap.with_payload(value, |table: &Table| table.entries.len()).unwrap_or(0)
    });

    heap.install_mark(table, |heap, value| {
        let traced = heap.with_payload(value, |table: &Table| {
            for &(k, v) in &table.entries {
                heap.mark(k);
                heap.mark(v);
            }
        });
        if let Err(err) = traced {
            warn!(%value, %err, "table entries not traced");
        }
    });

    table
}

fn snapshot(heap: &Heap, value: Value) -> Result<Table>
{
    heap.with_payload(value, Table::clone)
}
