//! Tagged values.

use core::fmt;

/// Identifies an instance slot in the pool.
///
/// The generation is bumped every time the slot is swept,
/// so an identifier that outlives its instance goes stale
/// instead of silently referring to whatever reuses the slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId
{
    /// Position of the header in the pool.
    pub index: u32,

    /// Generation of the slot when the instance was allocated.
    pub generation: u32,
}

impl fmt::Display for InstanceId
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        write!(f, "{}.{}", self.index, self.generation)
    }
}

/// A value the interpreter passes around.
///
/// Either an immediate, which carries everything it means inline,
/// or a reference to an instance in a [`Heap`][`crate::heap::Heap`].
/// Immediates are never looked up in the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Value
{
    /// Inline integer.
    Int(i64),

    /// The true singleton.
    True,

    /// The false singleton.
    False,

    /// The nil singleton.
    Nil,

    /// The undefined singleton.
    ///
    /// Returned by lookups that find nothing.
    Undefined,

    /// Reference to an instance.
    Ref(InstanceId),
}

impl Value
{
    /// Whether the value carries its meaning inline.
    #[inline]
    pub fn is_immediate(self) -> bool
    {
        !matches!(self, Value::Ref(_))
    }

    /// The instance this value refers to, if any.
    #[inline]
    pub fn as_instance(self) -> Option<InstanceId>
    {
        match self {
            Value::Ref(id) => Some(id),
            _ => None,
        }
    }

    /// The integer this value carries, if any.
    #[inline]
    pub fn as_int(self) -> Option<i64>
    {
        match self {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }

    /// The boolean this value carries, if any.
    #[inline]
    pub fn as_bool(self) -> Option<bool>
    {
        match self {
            Value::True => Some(true),
            Value::False => Some(false),
            _ => None,
        }
    }

    /// Forth truthiness: everything except false, nil, undefined and zero.
    pub fn is_truthy(self) -> bool
    {
        !matches!(self, Value::False | Value::Nil | Value::Undefined | Value::Int(0))
    }

    /// Name used for immediates by [`Heap::type_name`].
    ///
    /// Returns [`None`] for references.
    ///
    /// [`Heap::type_name`]: `crate::heap::Heap::type_name`
    pub fn immediate_type_name(self) -> Option<&'static str>
    {
        match self {
            Value::Int(_) => Some("integer"),
            Value::True | Value::False => Some("boolean"),
            Value::Nil => Some("nil"),
            Value::Undefined => Some("undefined"),
            Value::Ref(_) => None,
        }
    }
}

impl From<i64> for Value
{
    fn from(i: i64) -> Self
    {
        Value::Int(i)
    }
}

impl From<bool> for Value
{
    fn from(b: bool) -> Self
    {
        if b { Value::True } else { Value::False }
    }
}

impl From<InstanceId> for Value
{
    fn from(id: InstanceId) -> Self
    {
        Value::Ref(id)
    }
}

impl fmt::Display for Value
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::True => f.write_str("true"),
            Value::False => f.write_str("false"),
            Value::Nil => f.write_str("nil"),
            Value::Undefined => f.write_str("undefined"),
            Value::Ref(id) => write!(f, "#<{}>", id),
        }
    }
}
