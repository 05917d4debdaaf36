use crate::value::InstanceId;
use crate::value::Value;
use super::Heap;

use core::cell::Cell;
use core::cell::RefCell;
use scopeguard::defer;
use smallvec::SmallVec;
use tracing::warn;

/// One level of the protection frame stack.
pub (crate) struct Frame
{
    /// The callable unit that pushed the frame.
    pub (crate) caller: Value,

    /// Instances allocated or attached while the frame was active.
    pub (crate) instances: SmallVec<[InstanceId; 8]>,
}

/// Stack of protection frames.
///
/// Everything attached to a frame on this stack is a root,
/// whether or not the operand stack still refers to it.
/// At depth zero no frame is active
/// and allocations are not attached to anything.
///
/// It is important that the stack is managed by balanced
/// [`push_frame`][`Heap::push_frame`] and [`pop_frame`][`Heap::pop_frame`]
/// calls, or by [`with_frame`][`Heap::with_frame`], which does this for you.
pub (crate) struct FrameStack
{
    pub (crate) frames: RefCell<Vec<Frame>>,

    /// Pushes refused because the stack was full.
    /// Each one is undone by a pop before any real frame is popped.
    overflow: Cell<usize>,

    max_depth: usize,
}

impl FrameStack
{
    pub (crate) fn new(max_depth: usize) -> Self
    {
        Self{
            frames: RefCell::new(Vec::new()),
            overflow: Cell::new(0),
            max_depth,
        }
    }

    /// Logical depth, counting clamped pushes.
    pub (crate) fn depth(&self) -> usize
    {
        self.frames.borrow().len() + self.overflow.get()
    }

    pub (crate) fn attach(&self, id: InstanceId)
    {
        if let Some(frame) = self.frames.borrow_mut().last_mut() {
            frame.instances.push(id);
        }
    }

    pub (crate) fn clear(&self)
    {
        self.frames.borrow_mut().clear();
        self.overflow.set(0);
    }
}

/// Methods for managing protection frames.
impl Heap
{
    /// Enter a protection scope on behalf of `caller`.
    ///
    /// Until the matching [`pop_frame`][`Self::pop_frame`],
    /// every instance allocated is a root.
    /// When the maximum depth is reached, the push is clamped:
    /// new instances attach to the innermost real frame instead.
    pub fn push_frame(&self, caller: Value)
    {
        let mut frames = self.frames.frames.borrow_mut();
        if frames.len() >= self.frames.max_depth {
            let overflow = self.frames.overflow.get() + 1;
            self.frames.overflow.set(overflow);
            warn!(overflow, max_depth = self.frames.max_depth, "protection frame stack full");
            return;
        }
        frames.push(Frame{caller, instances: SmallVec::new()});
    }

    /// Leave the innermost protection scope.
    ///
    /// Popping with no frame active is reported and ignored.
    pub fn pop_frame(&self)
    {
        let overflow = self.frames.overflow.get();
        if overflow > 0 {
            self.frames.overflow.set(overflow - 1);
            return;
        }
        if self.frames.frames.borrow_mut().pop().is_none() {
            warn!("pop_frame called with no protection frame active");
        }
    }

    /// Run `then` inside a fresh protection scope.
    ///
    /// The scope is left as soon as `then` returns or panics.
    pub fn with_frame<F, R>(&self, caller: Value, then: F) -> R
        where F: FnOnce(&Self) -> R
    {
        self.push_frame(caller);
        defer! { self.pop_frame(); }
        then(self)
    }

    /// Number of active protection frames.
    pub fn frame_depth(&self) -> usize
    {
        self.frames.depth()
    }

    /// The caller that pushed the frame at `level`, counted from the bottom.
    pub fn frame_caller(&self, level: usize) -> Option<Value>
    {
        self.frames.frames.borrow().get(level).map(|frame| frame.caller)
    }

    /// Drop frames until the depth is at most `depth`.
    ///
    /// Used after an unwind that skipped the balancing pops.
    /// Instances attached to the dropped frames lose their protection.
    pub fn resync_frames(&self, depth: usize)
    {
        let overflow = self.frames.overflow.get();
        let mut frames = self.frames.frames.borrow_mut();
        if frames.len() + overflow <= depth {
            return;
        }
        if depth >= frames.len() {
            self.frames.overflow.set(depth - frames.len());
        } else {
            self.frames.overflow.set(0);
            frames.truncate(depth);
        }
    }

    /// Attach an existing instance to the innermost frame.
    ///
    /// Returns whether there was a frame to attach to.
    pub fn attach(&self, value: Value) -> bool
    {
        match self.live_slot(value) {
            Ok((id, _)) if self.frames.depth() > 0 => {
                self.frames.attach(id);
                true
            },
            _ => false,
        }
    }

    /// Instances attached to the frame at `level`.
    pub fn frame_instances(&self, level: usize) -> Vec<Value>
    {
        self.frames.frames.borrow()
            .get(level)
            .map(|frame| frame.instances.iter().copied().map(Value::Ref).collect())
            .unwrap_or_default()
    }
}
