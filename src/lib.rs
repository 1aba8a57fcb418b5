//! # basm
//!
//! An interpreter for a small line-oriented assembly language.
//!
//! Programs use four integer registers (A, B, C, D), arithmetic and compare
//! instructions, labeled jumps conditioned on the last comparison, and
//! `call`/`ret` subroutines. Source is loaded into an in-memory instruction
//! list with a resolved label table, then executed by a [`Machine`].

pub mod asm;
pub mod vm;
pub mod interp;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use asm::{load, load_with, LoadError, LoadOptions, Program, LabelTable};
pub use vm::{Machine, MachineError, MachineState, EndKind, Register, RegisterFile, Comparator, Instruction};
pub use interp::{run, execute, execute_to, EndPolicy, Error, ExitStatus, Report, RunConfig};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
