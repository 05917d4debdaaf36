//! The runtime context and everything it manages.
//!
//! # Roots
//!
//! An instance survives a collection when it is reachable
//! from one of the roots below, or holds a live bit of its own.
//!
//! | Root                  | Lifetime                                     |
//! |-----------------------|----------------------------------------------|
//! | Operand stack         | Until popped                                 |
//! | Protection frame      | Until the frame it was attached to is popped |
//! | Frame caller          | Until its frame is popped                    |
//! | [`protect`] bit       | Until the matching [`unprotect`]             |
//! | [`make_permanent`]    | Until the heap is dropped                    |
//! | [`mark`] outside a GC | Exactly one collection                       |
//!
//! [`protect`]: `Heap::protect`
//! [`unprotect`]: `Heap::unprotect`
//! [`make_permanent`]: `Heap::make_permanent`
//! [`mark`]: `Heap::mark`

pub use self::heap::*;

// The order of these declarations influences
// the order of the Heap impls in rustdoc.
mod heap;
mod alloc;
mod stack;
mod frame;
mod protect;
mod collect;

mod pool;
