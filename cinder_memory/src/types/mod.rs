//! Type descriptors and polymorphic dispatch.
//!
//! Every dynamic type (array, string, port, matcher, ...) registers
//! a descriptor with the heap and installs the callbacks it supports.
//! The core never knows any concrete type:
//! generic operations look the behavior up in the descriptor
//! of the value they are given, and fall back to a default when absent.

pub use self::dispatch::*;

use core::cell::RefCell;
use core::fmt;

#[macro_use] mod macros;

mod dispatch;
mod invoke;
mod registry;

pub (crate) use self::registry::Registry;

/// Handle to a registered type.
///
/// Descriptors are permanent, so the handle stays valid
/// for as long as the heap that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Descriptor(pub (crate) u32);

impl Descriptor
{
    /// Position of the descriptor in the registry.
    #[inline]
    pub fn index(self) -> usize
    {
        self.0 as usize
    }
}

impl fmt::Display for Descriptor
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        write!(f, "#{}", self.0)
    }
}

/// Numeric type tag, unique within a heap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub u32);

impl fmt::Display for Tag
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

/// Registry record of a dynamic type.
pub struct TypeDescriptor
{
    /// Name shown by default `inspect` and in diagnostics.
    pub name: String,

    /// See [`Tag`].
    pub tag: Tag,

    /// Type this one was derived from, if any.
    pub base: Option<Descriptor>,

    /// Installed callbacks.
    /// Only ever mutated by the `install_*` methods.
    pub (crate) dispatch: RefCell<Dispatch>,
}

impl TypeDescriptor
{
    /// Whether a callback is installed for the behavior.
    pub fn has(&self, behavior: Behavior) -> bool
    {
        self.dispatch.borrow().has(behavior)
    }
}

/// The optional behaviors a type may install.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Behavior
{
    Inspect,
    ToString,
    Dump,
    ToSequence,
    Copy,
    Get,
    Set,
    Equal,
    Length,
    Mark,
    Free,
    Call,
}

impl Behavior
{
    /// Every behavior, in dispatch table order.
    pub const ALL: [Behavior; 12] = [
        Behavior::Inspect,
        Behavior::ToString,
        Behavior::Dump,
        Behavior::ToSequence,
        Behavior::Copy,
        Behavior::Get,
        Behavior::Set,
        Behavior::Equal,
        Behavior::Length,
        Behavior::Mark,
        Behavior::Free,
        Behavior::Call,
    ];

    /// Name used in diagnostics.
    pub fn name(self) -> &'static str
    {
        match self {
            Behavior::Inspect => "inspect",
            Behavior::ToString => "to-string",
            Behavior::Dump => "dump",
            Behavior::ToSequence => "to-sequence",
            Behavior::Copy => "copy",
            Behavior::Get => "get",
            Behavior::Set => "set",
            Behavior::Equal => "equal",
            Behavior::Length => "length",
            Behavior::Mark => "mark",
            Behavior::Free => "free",
            Behavior::Call => "call",
        }
    }
}

impl fmt::Display for Behavior
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        f.write_str(self.name())
    }
}
