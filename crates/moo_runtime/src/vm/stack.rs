//! The shared operand stack.
//!
//! One stack serves every frame of a run. A frame owns the slots from its
//! `base` upwards; returning truncates the stack back to that base. Frames
//! hold indices, never references into the buffer, so growth is harmless.

use moo_core::Value;

use crate::errors::Fault;

#[derive(Debug, Default)]
pub(crate) struct OperandStack {
    values: Vec<Value>,
}

impl OperandStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    #[inline(always)]
    pub(crate) fn push(&mut self, v: Value) {
        self.values.push(v);
    }

    #[inline(always)]
    pub(crate) fn pop(&mut self) -> Result<Value, Fault> {
        self.values.pop().ok_or(Fault::StackUnderflow)
    }

    /// Pop two values, returning them in push order: `(a, b)` for `a op b`.
    #[inline(always)]
    pub(crate) fn pop2(&mut self) -> Result<(Value, Value), Fault> {
        let b = self.pop()?;
        let a = self.pop()?;
        Ok((a, b))
    }

    /// The value `k` slots below the top; `peek(0)` is the top.
    pub(crate) fn peek(&self, k: usize) -> Result<&Value, Fault> {
        let len = self.values.len();
        if k >= len {
            return Err(Fault::StackUnderflow);
        }
        Ok(&self.values[len - 1 - k])
    }

    /// The value at an absolute index.
    pub(crate) fn get(&self, idx: usize) -> Result<&Value, Fault> {
        self.values.get(idx).ok_or(Fault::BadSlot(idx))
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
    }

    pub(crate) fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_below_zero_is_a_fault() {
        let mut s = OperandStack::new();
        assert_eq!(s.pop(), Err(Fault::StackUnderflow));
        s.push(Value::Int(1));
        assert_eq!(s.peek(1), Err(Fault::StackUnderflow));
    }

    #[test]
    fn peek_counts_from_the_top() {
        let mut s = OperandStack::new();
        s.push(Value::Int(1));
        s.push(Value::Int(2));
        assert_eq!(s.peek(0), Ok(&Value::Int(2)));
        assert_eq!(s.peek(1), Ok(&Value::Int(1)));
        assert_eq!(s.pop2(), Ok((Value::Int(1), Value::Int(2))));
        assert_eq!(s.len(), 0);
    }
}
