//! In-memory representation of instances.

use crate::types::Descriptor;
use crate::value::Value;

use bitflags::bitflags;
use core::any::Any;
use core::cell::Cell;
use core::cell::RefCell;
use rustc_hash::FxHashMap;

mod payload;
mod properties;

/// Opaque data owned by the type that created an instance.
///
/// The core never looks inside.
/// Collaborators get it back through
/// [`with_payload`][`crate::heap::Heap::with_payload`]
/// and, once the instance is swept, through their free callback.
pub type Payload = Box<dyn Any>;

bitflags!
{
    /// Lifecycle bits of an instance header.
    ///
    /// The bits are independent of each other.
    /// Any of [`LIVE`][`Flags::LIVE`] keeps the instance
    /// alive through the next sweep.
    pub struct Flags: u8
    {
        /// The header is on the free list and has no payload.
        const FREED = 1 << 0;

        /// Reached during the current collection, or marked by hand.
        ///
        /// Cleared by every sweep, so it never outlives one cycle.
        const MARKED = 1 << 1;

        /// Explicitly protected until unprotected.
        const PROTECTED = 1 << 2;

        /// Never swept. Cannot be unset.
        const PERMANENT = 1 << 3;

        /// Bits that keep an instance alive.
        const LIVE = Self::MARKED.bits | Self::PROTECTED.bits | Self::PERMANENT.bits;
    }
}

/// Header of an instance slot.
///
/// Headers live in pool chunks that never move,
/// and every field uses interior mutability,
/// so the heap can hand out shared references to a header
/// while collaborator callbacks re-enter it.
pub struct Instance
{
    /// Bumped every time the slot is swept.
    pub (crate) generation: Cell<u32>,

    /// See [`Flags`].
    pub (crate) flags: Cell<Flags>,

    /// Number of unmatched `protect` calls.
    /// [`Flags::PROTECTED`] is set exactly while this is nonzero.
    pub (crate) protections: Cell<u32>,

    /// Type of the instance; [`None`] only while freed.
    pub (crate) descriptor: Cell<Option<Descriptor>>,

    /// See [`Payload`]; [`None`] only while freed.
    pub (crate) payload: RefCell<Option<Payload>>,

    /// Result of the last `to_sequence` call.
    pub (crate) sequence: Cell<Option<Value>>,

    /// Whether `sequence` must be recomputed.
    pub (crate) sequence_dirty: Cell<bool>,

    /// Properties attached to the instance, created on first use.
    pub (crate) properties: RefCell<Option<Box<FxHashMap<String, Value>>>>,

    /// Value run by debuggers when the instance is touched.
    pub (crate) debug_hook: Cell<Option<Value>>,

    /// Position of the cyclic iteration cursor.
    pub (crate) cursor: Cell<usize>,

    /// Next header on the free list.
    pub (crate) next_free: Cell<Option<u32>>,
}

impl Instance
{
    /// Header of a slot that was never issued.
    pub (crate) fn vacant() -> Self
    {
        Self{
            generation: Cell::new(0),
            flags: Cell::new(Flags::FREED),
            protections: Cell::new(0),
            descriptor: Cell::new(None),
            payload: RefCell::new(None),
            sequence: Cell::new(None),
            sequence_dirty: Cell::new(true),
            properties: RefCell::new(None),
            debug_hook: Cell::new(None),
            cursor: Cell::new(0),
            next_free: Cell::new(None),
        }
    }

    /// Current lifecycle bits.
    #[inline]
    pub fn flags(&self) -> Flags
    {
        self.flags.get()
    }

    /// Type of the instance, unless the slot is freed.
    #[inline]
    pub fn descriptor(&self) -> Option<Descriptor>
    {
        self.descriptor.get()
    }

    #[inline]
    pub (crate) fn insert_flags(&self, flags: Flags)
    {
        self.flags.set(self.flags.get() | flags);
    }

    #[inline]
    pub (crate) fn remove_flags(&self, flags: Flags)
    {
        self.flags.set(self.flags.get() - flags);
    }

    /// Whether the header is on the free list.
    #[inline]
    pub fn is_freed(&self) -> bool
    {
        self.flags().contains(Flags::FREED)
    }

    /// Bring a freed header back to life.
    ///
    /// The instance starts out live, unprotected and not permanent.
    /// Returns the generation the new instance is identified by.
    pub (crate) fn occupy(&self, descriptor: Descriptor, payload: Payload) -> u32
    {
        debug_assert!(self.is_freed());
        self.flags.set(Flags::empty());
        self.protections.set(0);
        self.descriptor.set(Some(descriptor));
        *self.payload.borrow_mut() = Some(payload);
        self.sequence.set(None);
        self.sequence_dirty.set(true);
        self.cursor.set(0);
        self.next_free.set(None);
        self.generation.get()
    }

    /// Turn the header into a tombstone and return what it owned.
    ///
    /// Identifiers issued for the old generation go stale.
    pub (crate) fn tombstone(&self) -> Option<Payload>
    {
        self.flags.set(Flags::FREED);
        self.protections.set(0);
        self.descriptor.set(None);
        self.generation.set(self.generation.get().wrapping_add(1));
        self.sequence.set(None);
        self.sequence_dirty.set(true);
        self.debug_hook.set(None);
        self.cursor.set(0);
        self.properties.borrow_mut().take();
        self.payload.borrow_mut().take()
    }

    /// Values the header itself refers to,
    /// independent of what the payload holds.
    pub (crate) fn intrinsic_children(&self, into: &mut Vec<Value>)
    {
        if let Some(sequence) = self.sequence.get() {
            into.push(sequence);
        }
        if let Some(hook) = self.debug_hook.get() {
            into.push(hook);
        }
        if let Some(properties) = self.properties.borrow().as_ref() {
            into.extend(properties.values().copied());
        }
    }
}
