//! Mark and sweep.
//!
//! A collection runs in two phases.
//!
//! **Mark.** Every value on the operand stack, every instance attached
//! to an active protection frame, and every frame's caller gets the
//! transient [`MARKED`] bit. Then the whole pool is scanned once:
//! each unfreed instance with any [`LIVE`] bit is marked and put on the
//! gray list. The gray list is drained by invoking each instance's mark
//! callback (which calls [`Heap::mark`] on the children it holds) and
//! marking the values its header refers to. Children that were not yet
//! marked are marked and put on the gray list in turn, so every
//! reachable instance is traced exactly once, however deep the nesting.
//!
//! **Sweep.** The pool is scanned again. Survivors lose their transient
//! bit (protected and permanent bits are left alone); everything else is
//! tombstoned, put on the free list, and handed to its type's free
//! callback.
//!
//! [`MARKED`]: `crate::object::Flags::MARKED`
//! [`LIVE`]: `crate::object::Flags::LIVE`

use crate::config::HeapConfig;
use crate::object::Flags;
use crate::value::InstanceId;
use crate::value::Value;
use super::Heap;

use core::cell::Cell;
use core::cell::RefCell;
use scopeguard::defer;
use std::time::Instant;
use tracing::debug;

/// What the collector is currently doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub (crate) enum Phase
{
    Idle,
    Marking,
    Sweeping,
}

/// Collector bookkeeping.
pub (crate) struct Collector
{
    pub (crate) phase: Cell<Phase>,

    /// Marked instances whose children have not been traced yet.
    gray: RefCell<Vec<InstanceId>>,

    /// Whether allocations may trigger collections.
    enabled: Cell<bool>,

    /// Live count at which the next automatic collection runs.
    next_collection: Cell<usize>,

    pub (crate) collections: Cell<u64>,
    pub (crate) total_freed: Cell<u64>,
    pub (crate) last_freed: Cell<usize>,
    pub (crate) allocations: Cell<u64>,
}

impl Collector
{
    pub (crate) fn new(config: &HeapConfig) -> Self
    {
        Self{
            phase: Cell::new(Phase::Idle),
            gray: RefCell::new(Vec::new()),
            enabled: Cell::new(config.collection_enabled),
            next_collection: Cell::new(config.high_water_mark),
            collections: Cell::new(0),
            total_freed: Cell::new(0),
            last_freed: Cell::new(0),
            allocations: Cell::new(0),
        }
    }

    #[inline]
    pub (crate) fn record_allocation(&self)
    {
        self.allocations.set(self.allocations.get() + 1);
    }

    #[inline]
    pub (crate) fn is_marking(&self) -> bool
    {
        self.phase.get() == Phase::Marking
    }

    pub (crate) fn push_gray(&self, id: InstanceId)
    {
        self.gray.borrow_mut().push(id);
    }

    fn pop_gray(&self) -> Option<InstanceId>
    {
        self.gray.borrow_mut().pop()
    }
}

/// Methods for running the garbage collector.
impl Heap
{
    /// Run a full collection now.
    ///
    /// Returns the number of instances freed.
    /// A collection requested while one is already running,
    /// or while a payload is borrowed, does nothing and returns zero.
    pub fn collect(&self) -> usize
    {
        if self.collector.phase.get() != Phase::Idle {
            debug!("collection requested during a collection; skipped");
            return 0;
        }
        if self.payload_borrows.get() > 0 {
            debug!(
                borrows = self.payload_borrows.get(),
                "collection requested while payloads are borrowed; skipped"
            );
            return 0;
        }

        let start = Instant::now();
        defer! { self.collector.phase.set(Phase::Idle); }

        self.collector.phase.set(Phase::Marking);
        self.mark_roots();
        self.seed_gray();
        self.drain_gray();

        self.collector.phase.set(Phase::Sweeping);
        let freed = self.sweep();

        self.pool.update_recycling(self.config.reuse_threshold);

        let collector = &self.collector;
        collector.collections.set(collector.collections.get() + 1);
        collector.total_freed.set(collector.total_freed.get() + freed as u64);
        collector.last_freed.set(freed);

        debug!(
            freed,
            live = self.pool.live(),
            recycling = self.pool.is_recycling(),
            elapsed = ?start.elapsed(),
            "collection finished"
        );

        freed
    }

    /// Collect if enabled and the high-water mark has been reached.
    ///
    /// Afterwards the mark is raised above the surviving live count,
    /// so a heap that is legitimately large
    /// does not collect on every allocation.
    pub (crate) fn collect_if_needed(&self)
    {
        if !self.collector.enabled.get() {
            return;
        }
        if self.pool.live() < self.collector.next_collection.get() {
            return;
        }
        if self.collector.phase.get() != Phase::Idle || self.payload_borrows.get() > 0 {
            return;
        }

        self.collect();

        let high_water_mark = self.config.high_water_mark;
        let next = high_water_mark.max(self.pool.live() + high_water_mark / 2);
        self.collector.next_collection.set(next);
    }

    /// Turn automatic collection on or off.
    pub fn set_collection_enabled(&self, enabled: bool)
    {
        self.collector.enabled.set(enabled);
    }

    /// Whether allocations may trigger collections.
    pub fn collection_enabled(&self) -> bool
    {
        self.collector.enabled.get()
    }

    /// Free every instance, permanent ones included.
    ///
    /// The operand stack and the protection frames are cleared first.
    /// Runs automatically when the heap is dropped.
    /// Returns the number of instances freed.
    /// Like [`collect`][`Self::collect`], this does nothing
    /// during a collection or while a payload is borrowed.
    pub fn teardown(&self) -> usize
    {
        if self.collector.phase.get() != Phase::Idle {
            debug!("teardown requested during a collection; skipped");
            return 0;
        }
        if self.payload_borrows.get() > 0 {
            debug!(
                borrows = self.payload_borrows.get(),
                "teardown requested while payloads are borrowed; skipped"
            );
            return 0;
        }
        defer! { self.collector.phase.set(Phase::Idle); }
        self.collector.phase.set(Phase::Sweeping);

        self.clear_stack();
        self.frames.clear();

        let mut doomed = Vec::new();
        self.pool.for_each(|index, slot| {
            if !slot.is_freed() {
                doomed.push(index);
            }
        });

        let freed = doomed.len();
        for index in doomed {
            self.release(index);
        }

        debug!(freed, "heap torn down");
        freed
    }

    /// Give roots the transient bit without tracing them yet.
    fn mark_roots(&self)
    {
        let collector = &self.collector;
        collector.gray.borrow_mut().clear();

        for &value in self.stack.borrow().iter() {
            self.set_marked(value);
        }

        for frame in self.frames.frames.borrow().iter() {
            self.set_marked(frame.caller);
            for &id in frame.instances.iter() {
                self.set_marked(Value::Ref(id));
            }
        }
    }

    fn set_marked(&self, value: Value)
    {
        let id = match value.as_instance() {
            Some(id) => id,
            None => return,
        };
        if let Some(slot) = self.pool.resolve(id) {
            slot.insert_flags(Flags::MARKED);
        }
    }

    /// Put every instance with a live bit on the gray list.
    fn seed_gray(&self)
    {
        let mut gray = self.collector.gray.borrow_mut();
        self.pool.for_each(|index, slot| {
            let flags = slot.flags();
            if !flags.contains(Flags::FREED) && flags.intersects(Flags::LIVE) {
                slot.insert_flags(Flags::MARKED);
                gray.push(InstanceId{index, generation: slot.generation.get()});
            }
        });
    }

    fn drain_gray(&self)
    {
        let mut children = Vec::new();
        while let Some(id) = self.collector.pop_gray() {
            let slot = match self.pool.resolve(id) {
                Some(slot) => slot,
                None => continue,
            };

            children.clear();
            slot.intrinsic_children(&mut children);
            for &child in &children {
                self.mark(child);
            }

            let mark = slot.descriptor()
                .and_then(|descriptor| self.registry.dispatch(descriptor))
                .and_then(|dispatch| dispatch.mark);
            if let Some(mark) = mark {
                mark(self, Value::Ref(id));
            }
        }
    }

    fn sweep(&self) -> usize
    {
        let mut doomed = Vec::new();
        self.pool.for_each(|index, slot| {
            let flags = slot.flags();
            if flags.contains(Flags::FREED) {
                return;
            }
            if flags.intersects(Flags::LIVE) {
                slot.remove_flags(Flags::MARKED);
            } else {
                doomed.push(index);
            }
        });

        let freed = doomed.len();
        for index in doomed {
            self.release(index);
        }
        freed
    }

    /// Tombstone a header, recycle it, and release its payload.
    ///
    /// The free callback runs last, when the header is already on the
    /// free list, so the callback cannot observe a half freed instance.
    fn release(&self, index: u32)
    {
        let slot = match self.pool.slot(index) {
            Some(slot) => slot,
            None => return,
        };
        if slot.is_freed() {
            return;
        }

        let descriptor = slot.descriptor();
        let payload = slot.tombstone();
        self.pool.push_free(index, &slot);
        self.pool.dec_live();

        let free = descriptor
            .and_then(|descriptor| self.registry.dispatch(descriptor))
            .and_then(|dispatch| dispatch.free);
        match (free, payload) {
            (Some(free), Some(payload)) => free(self, payload),
            (_, payload) => drop(payload),
        }
    }
}
