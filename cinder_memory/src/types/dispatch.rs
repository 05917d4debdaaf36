use crate::error::Result;
use crate::heap::Heap;
use crate::object::Payload;
use crate::value::Value;
use super::Behavior;

use std::rc::Rc;

/// Renders an instance as text (`inspect`, `to_string`, `dump`).
pub type TextFn = Rc<dyn Fn(&Heap, Value) -> String>;

/// Produces a new value from an instance (`to_sequence`, `copy`).
pub type ConvertFn = Rc<dyn Fn(&Heap, Value) -> Result<Value>>;

/// Reads an element: receiver, index.
pub type GetFn = Rc<dyn Fn(&Heap, Value, Value) -> Result<Value>>;

/// Writes an element: receiver, index, item.
pub type SetFn = Rc<dyn Fn(&Heap, Value, Value, Value) -> Result<()>>;

/// Compares the receiver with another value.
pub type EqualFn = Rc<dyn Fn(&Heap, Value, Value) -> bool>;

/// Number of elements in an instance.
pub type LengthFn = Rc<dyn Fn(&Heap, Value) -> usize>;

/// Marks the instances a payload refers to,
/// by calling [`Heap::mark`] on each of them.
pub type MarkFn = Rc<dyn Fn(&Heap, Value)>;

/// Releases a payload after its instance was swept.
pub type FreeFn = Rc<dyn Fn(&Heap, Payload)>;

/// Executes an instance against the operand stack.
pub type CallFn = Rc<dyn Fn(&Heap, Value) -> Result<()>>;

/// Per-type table of optional callbacks.
///
/// Cloning a table clones the callback handles, not the callbacks,
/// which is how derived types start out with their base's behavior.
#[allow(missing_docs)]
#[derive(Clone, Default)]
pub struct Dispatch
{
    pub inspect: Option<TextFn>,
    pub to_string: Option<TextFn>,
    pub dump: Option<TextFn>,
    pub to_sequence: Option<ConvertFn>,
    pub copy: Option<ConvertFn>,
    pub get: Option<GetFn>,
    pub set: Option<SetFn>,
    pub equal: Option<EqualFn>,
    pub length: Option<LengthFn>,
    pub mark: Option<MarkFn>,
    pub free: Option<FreeFn>,
    pub call: Option<CallFn>,
}

impl Dispatch
{
    /// Whether a callback is installed for the behavior.
    pub fn has(&self, behavior: Behavior) -> bool
    {
        match behavior {
            Behavior::Inspect => self.inspect.is_some(),
            Behavior::ToString => self.to_string.is_some(),
            Behavior::Dump => self.dump.is_some(),
            Behavior::ToSequence => self.to_sequence.is_some(),
            Behavior::Copy => self.copy.is_some(),
            Behavior::Get => self.get.is_some(),
            Behavior::Set => self.set.is_some(),
            Behavior::Equal => self.equal.is_some(),
            Behavior::Length => self.length.is_some(),
            Behavior::Mark => self.mark.is_some(),
            Behavior::Free => self.free.is_some(),
            Behavior::Call => self.call.is_some(),
        }
    }
}

install_methods!
{
    /// Install the callback behind [`Heap::inspect`].
    pub fn install_inspect(inspect, Behavior::Inspect):
        { Fn(&Heap, Value) -> String };

    /// Install the callback behind [`Heap::stringify`].
    pub fn install_to_string(to_string, Behavior::ToString):
        { Fn(&Heap, Value) -> String };

    /// Install the callback behind [`Heap::dump`].
    pub fn install_dump(dump, Behavior::Dump):
        { Fn(&Heap, Value) -> String };

    /// Install the callback behind [`Heap::to_sequence`].
    ///
    /// Results are cached on the instance until it is invalidated.
    pub fn install_to_sequence(to_sequence, Behavior::ToSequence):
        { Fn(&Heap, Value) -> Result<Value> };

    /// Install the callback behind [`Heap::copy`].
    pub fn install_copy(copy, Behavior::Copy):
        { Fn(&Heap, Value) -> Result<Value> };

    /// Install the callback behind [`Heap::get`].
    pub fn install_get(get, Behavior::Get):
        { Fn(&Heap, Value, Value) -> Result<Value> };

    /// Install the callback behind [`Heap::set`].
    pub fn install_set(set, Behavior::Set):
        { Fn(&Heap, Value, Value, Value) -> Result<()> };

    /// Install the callback behind [`Heap::equal`].
    pub fn install_equal(equal, Behavior::Equal):
        { Fn(&Heap, Value, Value) -> bool };

    /// Install the callback behind [`Heap::length`].
    pub fn install_length(length, Behavior::Length):
        { Fn(&Heap, Value) -> usize };

    /// Install the callback the collector uses
    /// to find the instances a payload refers to.
    ///
    /// The callback runs once per collection for every live instance
    /// and must call [`Heap::mark`] on each child.
    pub fn install_mark(mark, Behavior::Mark):
        { Fn(&Heap, Value) };

    /// Install the callback that releases a swept payload.
    ///
    /// Without one, the payload is simply dropped.
    pub fn install_free(free, Behavior::Free):
        { Fn(&Heap, Payload) };

    /// Install the callback behind [`Heap::call`],
    /// making instances of the type callable.
    pub fn install_call(call, Behavior::Call):
        { Fn(&Heap, Value) -> Result<()> };
}
