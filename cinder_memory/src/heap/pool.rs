use crate::object::Instance;
use crate::value::InstanceId;

use core::cell::Cell;
use core::cell::RefCell;
use core::ops::Deref;
use std::alloc::Layout;
use std::alloc::handle_alloc_error;
use std::rc::Rc;
use tracing::error;
use tracing::trace;

/// Growable table of instance headers.
///
/// The table is a list of equally sized chunks.
/// Chunks are never freed or moved once created,
/// so a [`SlotRef`] stays valid no matter how much the pool grows
/// while it is held.
pub (crate) struct Pool
{
    chunks: RefCell<Vec<Rc<[Instance]>>>,

    /// Number of headers in each chunk.
    increment: usize,

    /// Number of headers ever handed out.
    /// Headers at or beyond this index have never been used.
    issued: Cell<u32>,

    /// Head of the free list, threaded through [`Instance::next_free`].
    free_head: Cell<Option<u32>>,
    free_len: Cell<usize>,

    /// Whether allocation draws from the free list.
    /// See [`Pool::update_recycling`].
    recycling: Cell<bool>,

    /// Number of unfreed headers.
    live: Cell<usize>,
}

/// Shared reference to a header, keeping its chunk alive.
pub (crate) struct SlotRef
{
    chunk: Rc<[Instance]>,
    offset: usize,
}

impl Deref for SlotRef
{
    type Target = Instance;

    #[inline]
    fn deref(&self) -> &Instance
    {
        &self.chunk[self.offset]
    }
}

impl Pool
{
    pub (crate) fn new(increment: usize) -> Self
    {
        Self{
            chunks: RefCell::new(Vec::new()),
            increment,
            issued: Cell::new(0),
            free_head: Cell::new(None),
            free_len: Cell::new(0),
            recycling: Cell::new(false),
            live: Cell::new(0),
        }
    }

    /// Number of headers ever handed out.
    #[inline]
    pub (crate) fn issued(&self) -> u32
    {
        self.issued.get()
    }

    /// Number of headers the pool has room for without growing.
    pub (crate) fn capacity(&self) -> usize
    {
        self.chunks.borrow().len() * self.increment
    }

    #[inline]
    pub (crate) fn live(&self) -> usize
    {
        self.live.get()
    }

    #[inline]
    pub (crate) fn free_len(&self) -> usize
    {
        self.free_len.get()
    }

    /// The header at an index, if it was ever issued.
    pub (crate) fn slot(&self, index: u32) -> Option<SlotRef>
    {
        if index >= self.issued.get() {
            return None;
        }
        let index = index as usize;
        let chunk = self.chunks.borrow().get(index / self.increment)?.clone();
        Some(SlotRef{chunk, offset: index % self.increment})
    }

    /// The header an identifier refers to,
    /// if it still holds the instance the identifier was issued for.
    pub (crate) fn resolve(&self, id: InstanceId) -> Option<SlotRef>
    {
        let slot = self.slot(id.index)?;
        if slot.is_freed() || slot.generation.get() != id.generation {
            return None;
        }
        Some(slot)
    }

    /// Pick the header the next instance goes into.
    ///
    /// The free list is only consulted while recycling;
    /// otherwise a never used header is issued,
    /// growing the pool by one chunk if none is left.
    pub (crate) fn take(&self) -> (u32, SlotRef)
    {
        if self.recycling.get() {
            if let Some(taken) = self.pop_free() {
                return taken;
            }
        }
        self.take_fresh()
    }

    fn pop_free(&self) -> Option<(u32, SlotRef)>
    {
        let index = self.free_head.get()?;
        let slot = self.slot(index)?;
        self.free_head.set(slot.next_free.take());
        self.free_len.set(self.free_len.get() - 1);
        if self.free_head.get().is_none() {
            self.recycling.set(false);
        }
        Some((index, slot))
    }

    fn take_fresh(&self) -> (u32, SlotRef)
    {
        let index = self.issued.get();
        if index as usize == self.capacity() {
            self.grow();
        }
        self.issued.set(index + 1);

        let position = index as usize;
        let chunk = self.chunks.borrow()[position / self.increment].clone();
        (index, SlotRef{chunk, offset: position % self.increment})
    }

    fn grow(&self)
    {
        let mut chunks = self.chunks.borrow_mut();

        let capacity = (chunks.len() + 1) * self.increment;
        if capacity > u32::MAX as usize {
            error!(capacity, "instance pool exhausted the index space");
            std::process::abort();
        }

        if chunks.try_reserve(1).is_err() {
            handle_alloc_error(Layout::new::<Rc<[Instance]>>());
        }

        let chunk: Rc<[Instance]> =
            (0 .. self.increment).map(|_| Instance::vacant()).collect();
        chunks.push(chunk);

        trace!(capacity, "instance pool grown");
    }

    /// Put a tombstoned header on the free list.
    pub (crate) fn push_free(&self, index: u32, slot: &Instance)
    {
        slot.next_free.set(self.free_head.get());
        self.free_head.set(Some(index));
        self.free_len.set(self.free_len.get() + 1);
    }

    /// Decide whether the allocator recycles headers.
    ///
    /// Called after every collection.
    /// Once the free list holds `threshold` headers,
    /// the allocator drains it completely before issuing fresh ones.
    pub (crate) fn update_recycling(&self, threshold: usize)
    {
        if self.free_len.get() > 0 && self.free_len.get() >= threshold {
            self.recycling.set(true);
        }
    }

    #[inline]
    pub (crate) fn is_recycling(&self) -> bool
    {
        self.recycling.get()
    }

    pub (crate) fn inc_live(&self)
    {
        self.live.set(self.live.get() + 1);
    }

    pub (crate) fn dec_live(&self)
    {
        self.live.set(self.live.get() - 1);
    }

    /// Call `f` with every issued header, in index order.
    ///
    /// Headers issued while iterating are not visited.
    pub (crate) fn for_each(&self, mut f: impl FnMut(u32, &Instance))
    {
        let issued = self.issued.get();
        let chunks = self.chunks.borrow().clone();
        let headers = chunks.iter().flat_map(|chunk| chunk.iter());
        for (index, slot) in (0 .. issued).zip(headers) {
            f(index, slot);
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    use crate::types::Descriptor;

    fn occupy(pool: &Pool) -> InstanceId
    {
        let (index, slot) = pool.take();
        let generation = slot.occupy(Descriptor(0), Box::new(()));
        pool.inc_live();
        InstanceId{index, generation}
    }

    fn free(pool: &Pool, id: InstanceId)
    {
        let slot = pool.resolve(id).unwrap();
        slot.tombstone();
        pool.push_free(id.index, &slot);
        pool.dec_live();
    }

    #[test]
    fn grows_in_chunks()
    {
        let pool = Pool::new(4);
        assert_eq!(pool.capacity(), 0);
        occupy(&pool);
        assert_eq!(pool.capacity(), 4);
        for _ in 0 .. 4 {
            occupy(&pool);
        }
        assert_eq!(pool.capacity(), 8);
        assert_eq!(pool.issued(), 5);
        assert_eq!(pool.live(), 5);
    }

    #[test]
    fn stale_ids_do_not_resolve()
    {
        let pool = Pool::new(4);
        let id = occupy(&pool);
        free(&pool, id);
        assert!(pool.resolve(id).is_none());
        assert!(pool.resolve(InstanceId{index: 99, generation: 0}).is_none());
    }

    #[test]
    fn free_list_is_ignored_below_threshold()
    {
        let pool = Pool::new(4);
        let id = occupy(&pool);
        free(&pool, id);
        pool.update_recycling(2);
        assert!(!pool.is_recycling());
        assert_eq!(pool.take().0, 1);
    }

    #[test]
    fn free_list_is_drained_once_recycling()
    {
        let pool = Pool::new(4);
        let ids: Vec<_> = (0 .. 3).map(|_| occupy(&pool)).collect();
        for &id in &ids {
            free(&pool, id);
        }
        pool.update_recycling(3);
        assert!(pool.is_recycling());

        let mut taken: Vec<_> = (0 .. 3).map(|_| pool.take().0).collect();
        taken.sort_unstable();
        assert_eq!(taken, [0, 1, 2]);
        assert!(!pool.is_recycling());
        assert_eq!(pool.free_len(), 0);
        assert_eq!(pool.take().0, 3);
    }
}
