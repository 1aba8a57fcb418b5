//! The execution engine.
//!
//! This module implements the machine model:
//! - four integer registers A, B, C, D
//! - a comparator set by `cmp` and read by conditional jumps
//! - a call stack of return locations for `call`/`ret`
//! - a dispatcher stepping through a loaded program

pub mod registers;
pub mod comparator;
pub mod stack;
pub mod instruction;
pub mod execute;

pub use registers::{Register, RegisterFile};
pub use comparator::Comparator;
pub use stack::{CallStack, Frame};
pub use instruction::{Instruction, Operand, Condition, OperandError};
pub use execute::{Machine, MachineError, MachineState, EndKind, Step, Effect};
