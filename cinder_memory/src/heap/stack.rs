use crate::error::Error;
use crate::error::Result;
use crate::value::Value;
use super::Heap;

/// Methods for manipulating the operand stack.
///
/// The interpreter loop owns the meaning of the stack;
/// the heap only keeps it so the collector can scan it.
impl Heap
{
    /// Push a value.
    pub fn push(&self, value: Value)
    {
        self.stack.borrow_mut().push(value);
    }

    /// Pop the top value.
    pub fn pop(&self) -> Result<Value>
    {
        self.stack.borrow_mut().pop().ok_or(Error::StackUnderflow)
    }

    /// The top value, left in place.
    pub fn peek(&self) -> Result<Value>
    {
        self.pick(0)
    }

    /// The value `n` places below the top, left in place.
    pub fn pick(&self, n: usize) -> Result<Value>
    {
        let stack = self.stack.borrow();
        stack.len()
            .checked_sub(n)
            .and_then(|above| above.checked_sub(1))
            .map(|index| stack[index])
            .ok_or(Error::StackUnderflow)
    }

    /// Number of values on the stack.
    pub fn stack_depth(&self) -> usize
    {
        self.stack.borrow().len()
    }

    /// Drop values until at most `depth` remain.
    pub fn truncate_stack(&self, depth: usize)
    {
        self.stack.borrow_mut().truncate(depth);
    }

    /// Drop every value.
    pub fn clear_stack(&self)
    {
        self.stack.borrow_mut().clear();
    }

    /// Copy of the stack, bottom first.
    pub fn stack_values(&self) -> Vec<Value>
    {
        self.stack.borrow().clone()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    use proptest::collection::vec as pvec;
    use proptest::proptest;

    #[test]
    fn pop_on_empty_underflows()
    {
        let heap = Heap::new();
        assert_eq!(heap.pop(), Err(Error::StackUnderflow));
        assert_eq!(heap.peek(), Err(Error::StackUnderflow));
    }

    #[test]
    fn pick_counts_from_top()
    {
        let heap = Heap::new();
        heap.push(Value::Int(1));
        heap.push(Value::Int(2));
        heap.push(Value::Int(3));
        assert_eq!(heap.pick(0), Ok(Value::Int(3)));
        assert_eq!(heap.pick(2), Ok(Value::Int(1)));
        assert_eq!(heap.pick(3), Err(Error::StackUnderflow));
        assert_eq!(heap.pick(usize::MAX), Err(Error::StackUnderflow));
        heap.truncate_stack(1);
        assert_eq!(heap.stack_values(), [Value::Int(1)]);
    }

    proptest!
    {
        #[test]
        fn pops_reverse_pushes(values in pvec(proptest::num::i64::ANY, 0 .. 64))
        {
            let heap = Heap::new();
            for &v in &values {
                heap.push(Value::Int(v));
            }
            assert_eq!(heap.stack_depth(), values.len());
            for &v in values.iter().rev() {
                assert_eq!(heap.pop(), Ok(Value::Int(v)));
            }
            assert_eq!(heap.pop(), Err(Error::StackUnderflow));
        }
    }
}
