//! Memory management core of the cinder runtime.
//!
//! Dynamic values are either immediates (integers, booleans, nil,
//! undefined) or references to instances owned by a [`Heap`].
//! Every instance belongs to a type registered with the heap,
//! which decides how the instance is inspected, compared, traced
//! and released through its dispatch table.
//! Instances nobody can reach anymore are reclaimed
//! by a mark and sweep collector.

#![warn(missing_docs)]

pub use self::error::Error;
pub use self::error::Result;
pub use self::heap::Heap;
pub use self::stats::GcStats;
pub use self::value::InstanceId;
pub use self::value::Value;

pub mod config;
pub mod error;
pub mod heap;
pub mod object;
pub mod types;
pub mod value;

mod stats;
