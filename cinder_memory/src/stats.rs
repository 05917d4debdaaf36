//! Heap statistics.
//!
//! A [`GcStats`] is a snapshot; it does not follow the heap afterwards.

use crate::heap::Heap;
use crate::object::Flags;

use core::fmt;

/// Snapshot of the state of a heap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GcStats
{
    // Pool

    /// Instances that have not been freed.
    pub live: usize,
    /// Live instances that are permanent.
    pub permanent: usize,
    /// Live instances that are protected.
    pub protected: usize,
    /// Live instances whose transient mark bit is set.
    pub marked: usize,
    /// Headers that are tombstones.
    pub freed: usize,
    /// Headers ever handed out.
    pub pool_size: usize,
    /// Headers the pool has room for without growing.
    pub capacity: usize,

    // Roots

    /// Active protection frames.
    pub frame_depth: usize,

    // Collector

    /// Collections run since the heap was created.
    pub collections: u64,
    /// Instances freed by those collections.
    pub total_freed: u64,
    /// Instances freed by the most recent collection.
    pub last_freed: usize,
    /// Instances allocated since the heap was created.
    pub allocations: u64,
}

impl Heap
{
    /// Take a snapshot of the heap's statistics.
    ///
    /// This scans the whole pool.
    pub fn stats(&self) -> GcStats
    {
        let mut stats = GcStats{
            pool_size: self.pool.issued() as usize,
            capacity: self.pool.capacity(),
            frame_depth: self.frame_depth(),
            collections: self.collector.collections.get(),
            total_freed: self.collector.total_freed.get(),
            last_freed: self.collector.last_freed.get(),
            allocations: self.collector.allocations.get(),
            ..GcStats::default()
        };

        self.pool.for_each(|_, slot| {
            let flags = slot.flags();
            if flags.contains(Flags::FREED) {
                stats.freed += 1;
                return;
            }
            stats.live += 1;
            stats.permanent += flags.contains(Flags::PERMANENT) as usize;
            stats.protected += flags.contains(Flags::PROTECTED) as usize;
            stats.marked += flags.contains(Flags::MARKED) as usize;
        });

        stats
    }
}

impl fmt::Display for GcStats
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        writeln!(f, "heap statistics")?;
        writeln!(f, "  live         {:>10}", self.live)?;
        writeln!(f, "    permanent  {:>10}", self.permanent)?;
        writeln!(f, "    protected  {:>10}", self.protected)?;
        writeln!(f, "    marked     {:>10}", self.marked)?;
        writeln!(f, "  freed        {:>10}", self.freed)?;
        writeln!(f, "  pool size    {:>10} of {}", self.pool_size, self.capacity)?;
        writeln!(f, "  frame depth  {:>10}", self.frame_depth)?;
        writeln!(f, "  allocations  {:>10}", self.allocations)?;
        write!(
            f,
            "  collections  {:>10} ({} freed, {} last)",
            self.collections, self.total_freed, self.last_freed,
        )
    }
}
