use crate::config::HeapConfig;
use crate::error::Error;
use crate::error::Result;
use crate::types::Registry;
use crate::value::InstanceId;
use crate::value::Value;
use super::collect::Collector;
use super::frame::FrameStack;
use super::pool::Pool;
use super::pool::SlotRef;

use core::cell::Cell;
use core::cell::RefCell;
use core::fmt;

/// Everything one interpreter needs to manage dynamic values.
///
/// A heap bundles the type registry, the instance pool,
/// the protection frames, the operand stack and the collector.
/// There is no global state: independent heaps may coexist,
/// but values must never be passed from one heap to another.
///
/// All methods take `&self`.
/// Collaborator callbacks receive the same `&Heap`,
/// so they can mark children, allocate, or push onto the stack
/// while the heap is in the middle of an operation on their behalf.
pub struct Heap
{
    pub (crate) config: HeapConfig,

    /// See [`Registry`].
    pub (crate) registry: Registry,

    /// See [`Pool`].
    pub (crate) pool: Pool,

    /// See [`FrameStack`].
    pub (crate) frames: FrameStack,

    /// Values the interpreter is working on.
    /// Every value on it is a root.
    pub (crate) stack: RefCell<Vec<Value>>,

    /// See [`Collector`].
    pub (crate) collector: Collector,

    /// Number of payload borrows currently handed out.
    /// Collections are refused while this is nonzero.
    pub (crate) payload_borrows: Cell<usize>,
}

impl Heap
{
    // Looking for the methods that operate on the heap?
    // Those are spread over the sibling modules,
    // each with its own impl block.

    /// Create a heap with the default configuration.
    pub fn new() -> Self
    {
        Self::from_valid_config(HeapConfig::default())
    }

    /// Create a heap with the given configuration.
    pub fn with_config(config: HeapConfig) -> Result<Self>
    {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: HeapConfig) -> Self
    {
        Self{
            registry: Registry::new(config.registry_increment),
            pool: Pool::new(config.pool_increment),
            frames: FrameStack::new(config.max_frame_depth),
            stack: RefCell::new(Vec::new()),
            collector: Collector::new(&config),
            payload_borrows: Cell::new(0),
            config,
        }
    }

    /// The configuration the heap was created with.
    pub fn config(&self) -> &HeapConfig
    {
        &self.config
    }

    /// Whether a value refers to an instance that still exists.
    ///
    /// This is the membership test every generic operation performs
    /// before touching the header behind a value.
    pub fn contains(&self, value: Value) -> bool
    {
        self.live_slot(value).is_ok()
    }

    /// Number of instances that have not been freed.
    pub fn live_count(&self) -> usize
    {
        self.pool.live()
    }

    /// Resolve a value to the header of its instance.
    pub (crate) fn live_slot(&self, value: Value) -> Result<(InstanceId, SlotRef)>
    {
        let id = value.as_instance().ok_or(Error::NotAnInstance(value))?;
        let slot = self.pool.resolve(id).ok_or(Error::Stale(id))?;
        Ok((id, slot))
    }
}

impl Default for Heap
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl Drop for Heap
{
    fn drop(&mut self)
    {
        self.teardown();
    }
}

impl fmt::Debug for Heap
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        f.debug_struct("Heap")
            .field("types", &self.registry.len())
            .field("live", &self.pool.live())
            .field("issued", &self.pool.issued())
            .field("free", &self.pool.free_len())
            .field("frame_depth", &self.frames.depth())
            .field("stack_depth", &self.stack.borrow().len())
            .finish()
    }
}
