//! Cycle guards for callbacks that recurse into elements.
//!
//! Containers may hold themselves, directly or through other containers.
//! Every container type of one heap shares a single [`Visiting`],
//! so cycles are caught whichever types they pass through.

use cinder_memory::Value;

use core::cell::RefCell;
use scopeguard::defer;

/// Containers currently being inspected or compared.
#[derive(Debug, Default)]
pub (crate) struct Visiting
{
    inspecting: RefCell<Vec<Value>>,
    comparing: RefCell<Vec<(Value, Value)>>,
}

impl Visiting
{
    /// Run `render` unless `value` is already being inspected,
    /// in which case `placeholder` stands in for it.
    pub (crate) fn inspect(&self, value: Value, placeholder: &str,
                           render: impl FnOnce() -> String) -> String
    {
        if self.inspecting.borrow().contains(&value) {
            return placeholder.to_owned();
        }
        self.inspecting.borrow_mut().push(value);
        defer! { self.inspecting.borrow_mut().pop(); }
        render()
    }

    /// Run `compare` unless the same pair is already being compared.
    ///
    /// A pair met again while comparing it is assumed equal;
    /// any difference is found elsewhere in the structure.
    pub (crate) fn compare(&self, value: Value, other: Value,
                           compare: impl FnOnce() -> bool) -> bool
    {
        if self.comparing.borrow().contains(&(value, other)) {
            return true;
        }
        self.comparing.borrow_mut().push((value, other));
        defer! { self.comparing.borrow_mut().pop(); }
        compare()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn nested_visit_uses_placeholder()
    {
        let visiting = Visiting::default();
        let text = visiting.inspect(Value::Nil, "...", || {
            visiting.inspect(Value::Nil, "...", || String::from("unreachable"))
        });
        assert_eq!(text, "...");
        assert!(visiting.inspecting.borrow().is_empty());
    }

    #[test]
    fn repeated_pair_is_equal()
    {
        let visiting = Visiting::default();
        let equal = visiting.compare(Value::Int(1), Value::Int(2), || {
            visiting.compare(Value::Int(1), Value::Int(2), || false)
        });
        assert!(equal);
        assert!(visiting.comparing.borrow().is_empty());
    }
}
