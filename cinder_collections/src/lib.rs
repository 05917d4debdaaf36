//! Container types built on the cinder heap.
//!
//! Nothing in here is known to the core:
//! each type registers a descriptor and installs its callbacks
//! exactly like any other collaborator would.
//!
//! | Type        | Payload          | Notes                                  |
//! |-------------|------------------|----------------------------------------|
//! | `array`     | `Vec<Value>`     | Indexed by integers                    |
//! | `list`      | `Vec<Value>`     | Derived from `array`, prints as `( )`  |
//! | `string`    | [`String`]       | Sequence of character codes            |
//! | `table`     | [`Table`]        | Keys compared with [`Heap::equal`]     |
//! | `quotation` | [`Quotation`]    | Calling it calls every word in order   |

#![warn(missing_docs)]

pub use self::quotation::Quotation;
pub use self::table::Table;

use cinder_memory::Error;
use cinder_memory::Heap;
use cinder_memory::Result;
use cinder_memory::Value;
use cinder_memory::types::Descriptor;
use std::rc::Rc;
use tracing::debug;

mod array;
mod list;
mod quotation;
mod string;
mod table;
mod visit;

/// Descriptors of the container types registered with one heap.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Collections
{
    pub array: Descriptor,
    pub list: Descriptor,
    pub string: Descriptor,
    pub table: Descriptor,
    pub quotation: Descriptor,
}

impl Collections
{
    /// Register every container type with a heap.
    pub fn register(heap: &Heap) -> Result<Self>
    {
        let visiting = Rc::new(visit::Visiting::default());
        let array = array::register(heap, visiting.clone());
        let list = list::register(heap, array, visiting.clone())?;
        let string = string::register(heap, array);
        let table = table::register(heap, array, visiting.clone());
        let quotation = quotation::register(heap, visiting);

        debug!(types = heap.type_count(), "container types registered");

        Ok(Self{array, list, string, table, quotation})
    }

    /// Allocate an array holding the given items.
    pub fn array(&self, heap: &Heap, items: Vec<Value>) -> Result<Value>
    {
        heap.allocate(self.array, items)
    }

    /// Allocate a list holding the given items.
    pub fn list(&self, heap: &Heap, items: Vec<Value>) -> Result<Value>
    {
        heap.allocate(self.list, items)
    }

    /// Allocate a string.
    pub fn string(&self, heap: &Heap, text: &str) -> Result<Value>
    {
        heap.allocate(self.string, text.to_owned())
    }

    /// Allocate an empty table.
    pub fn table(&self, heap: &Heap) -> Result<Value>
    {
        heap.allocate(self.table, Table::default())
    }

    /// Allocate a quotation of the given words.
    pub fn quotation(&self, heap: &Heap, words: Vec<Value>) -> Result<Value>
    {
        heap.allocate(self.quotation, Quotation{words})
    }
}

/// Interpret a value as a position in a sequence of `len` elements.
pub (crate) fn position(index: Value, len: usize) -> Result<usize>
{
    let index = index.as_int()
        .ok_or_else(|| Error::Raised(format!("index {} is not an integer", index)))?;
    usize::try_from(index).ok()
        .filter(|&at| at < len)
        .ok_or(Error::IndexOutOfRange{index, len})
}

/// Join the inspected form of every value with spaces.
pub (crate) fn inspect_all(heap: &Heap, values: &[Value]) -> String
{
    values.iter()
        .map(|&value| heap.inspect(value))
        .collect::<Vec<_>>()
        .join(" ")
}
