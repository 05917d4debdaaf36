//! Recoverable errors.
//!
//! Running out of memory is not among them:
//! the pool and the registry abort the process when they cannot grow,
//! as the collector's bookkeeping may be half updated at that point.

use crate::types::Descriptor;
use crate::types::Tag;
use crate::value::InstanceId;
use crate::value::Value;

use thiserror::Error;

/// Convenient alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors reported by heap operations and dispatch callbacks.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error
{
    /// An operation that needs an instance was given an immediate.
    #[error("{0} is not an instance")]
    NotAnInstance(Value),

    /// The referenced instance has been swept.
    #[error("instance {0} no longer exists")]
    Stale(InstanceId),

    /// The payload is not of the type the caller asked for.
    #[error("payload of instance {id} is not a {expected}")]
    PayloadType
    {
        /// Instance whose payload was requested.
        id: InstanceId,
        /// Rust type name the caller expected.
        expected: &'static str,
    },

    /// The payload is already borrowed in a conflicting way.
    #[error("payload of instance {0} is already borrowed")]
    PayloadBorrowed(InstanceId),

    /// Popped from an empty operand stack.
    #[error("operand stack underflow")]
    StackUnderflow,

    /// A type with this tag is already registered.
    #[error("type tag {0} is already registered")]
    DuplicateTag(Tag),

    /// The descriptor does not belong to this heap.
    #[error("unknown type descriptor {0}")]
    UnknownDescriptor(Descriptor),

    /// Indexed access outside of a container.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange
    {
        /// Requested index.
        index: i64,
        /// Length of the container.
        len: usize,
    },

    /// A configuration value is out of range.
    #[error("invalid heap configuration: {0}")]
    Config(&'static str),

    /// Raised by a collaborator callback.
    #[error("{0}")]
    Raised(String),
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn messages()
    {
        let id = InstanceId{index: 7, generation: 2};
        assert_eq!(Error::Stale(id).to_string(), "instance 7.2 no longer exists");
        assert_eq!(
            Error::NotAnInstance(Value::Int(5)).to_string(),
            "5 is not an instance",
        );
        assert_eq!(
            Error::IndexOutOfRange{index: 4, len: 2}.to_string(),
            "index 4 out of range for length 2",
        );
    }
}
