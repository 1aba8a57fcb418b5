//! Call stack of return locations.

use serde::{Serialize, Deserialize};

/// One pending return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Instruction index to resume at after `ret`.
    pub return_to: usize,
    /// Source line of the `call` that pushed this frame.
    pub call_line: usize,
}

/// LIFO stack of [`Frame`]s pushed by `call` and popped by `ret`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallStack {
    frames: Vec<Frame>,
}

impl CallStack {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Pop the most recent frame, or `None` if nothing is pending.
    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Drop every pending frame.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames from the outermost call to the innermost.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(return_to: usize) -> Frame {
        Frame { return_to, call_line: return_to }
    }

    #[test]
    fn test_lifo_order() {
        let mut stack = CallStack::new();
        stack.push(frame(1));
        stack.push(frame(5));

        assert_eq!(stack.len(), 2);
        assert_eq!(stack.pop().map(|f| f.return_to), Some(5));
        assert_eq!(stack.pop().map(|f| f.return_to), Some(1));
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn test_clear_discards_everything() {
        let mut stack = CallStack::new();
        for i in 0..10 {
            stack.push(frame(i));
        }
        stack.clear();
        assert!(stack.is_empty());
    }
}
