//! Quotations: callable sequences of words.
//!
//! Calling a quotation calls each of its words in turn.
//! Immediates and non-callable instances push themselves,
//! nested quotations run in their own protection frame.

use crate::inspect_all;
use crate::position;
use crate::visit::Visiting;

use cinder_memory::Heap;
use cinder_memory::Value;
use cinder_memory::types::Descriptor;
use std::rc::Rc;
use tracing::warn;

/// Payload of a quotation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Quotation
{
    /// What calling the quotation calls.
    pub words: Vec<Value>,
}

pub (crate) fn register(heap: &Heap, visiting: Rc<Visiting>) -> Descriptor
{
    let quotation = heap.register_type("quotation");

    heap.install_inspect(quotation, move |heap, value| {
        visiting.inspect(value, "[: ... ;]", || match words(heap, value) {
            Some(words) if words.is_empty() => String::from("[: ;]"),
            Some(words) => format!("[: {} ;]", inspect_all(heap, &words)),
            None => String::from("[: ? ;]"),
        })
    });

    heap.install_call(quotation, |heap, value| {
        for word in words(heap, value).unwrap_or_default() {
            heap.call(word)?;
        }
        Ok(())
    });

    heap.install_get(quotation, |heap, value, index| {
        heap.with_payload(value, |quotation: &Quotation| {
            position(index, quotation.words.len()).map(|at| quotation.words[at])
        })?
    });

    heap.install_length(quotation, |heap, value| {
        heap.with_payload(value, |quotation: &Quotation| quotation.words.len())
            .unwrap_or(0)
    });

    heap.install_mark(quotation, |heap, value| {
        let traced = heap.with_payload(value, |quotation: &Quotation| {
            for &word in &quotation.words {
                heap.mark(word);
            }
        });
        if let Err(err) = traced {
            warn!(%value, %err, "quotation words not traced");
        }
    });

    quotation
}

fn words(heap: &Heap, value: Value) -> Option<Vec<Value>>
{
    heap.with_payload(value, |quotation: &Quotation| quotation.words.clone()).ok()
}
