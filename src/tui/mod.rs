//! TUI debugger.
//!
//! Provides an interactive terminal-based debugger with:
//! - Source listing with the current instruction and breakpoints
//! - Register, comparator and call stack views
//! - Step/run/breakpoint controls
//! - Output panel

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
