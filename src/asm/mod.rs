//! Source handling: tokenizing lines and loading programs.
//!
//! This module provides:
//! - A line tokenizer (mnemonic plus up to two operands, or a label)
//! - A single-pass loader that builds the label table and instruction list

pub mod tokenizer;
pub mod labels;
pub mod loader;

pub use labels::{Label, LabelTable};
pub use loader::{load, load_with, LoadError, LoadOptions, Program, Statement, MAX_INSTRUCTIONS};
