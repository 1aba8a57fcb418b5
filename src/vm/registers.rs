//! The register file.
//!
//! The machine has four general-purpose registers, A through D, each holding
//! a signed 32-bit integer. Registers are addressed by the [`Register`]
//! identifier rather than by position so an operand can name any of them
//! without aliasing another.

use serde::{Serialize, Deserialize};
use std::fmt;

/// A register identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Register {
    A,
    B,
    C,
    D,
}

impl Register {
    /// All registers in report order.
    pub const ALL: [Register; 4] = [Register::A, Register::B, Register::C, Register::D];

    /// Parse a register name, ignoring case.
    ///
    /// Returns `None` for anything that is not exactly one of `a`, `b`, `c`, `d`.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "a" | "A" => Some(Register::A),
            "b" | "B" => Some(Register::B),
            "c" | "C" => Some(Register::C),
            "d" | "D" => Some(Register::D),
            _ => None,
        }
    }

    /// The single-letter name of the register.
    pub fn name(self) -> char {
        match self {
            Register::A => 'A',
            Register::B => 'B',
            Register::C => 'C',
            Register::D => 'D',
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The register file: one `i32` slot per [`Register`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterFile {
    values: [i32; 4],
}

impl RegisterFile {
    /// Create a register file with every register zeroed.
    pub fn new() -> Self {
        Self { values: [0; 4] }
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        self.values = [0; 4];
    }

    /// Read a register.
    #[inline]
    pub fn get(&self, reg: Register) -> i32 {
        self.values[reg.index()]
    }

    /// Write a register.
    #[inline]
    pub fn set(&mut self, reg: Register, value: i32) {
        self.values[reg.index()] = value;
    }

    /// Replace a register's value with `f(old)`.
    pub fn update(&mut self, reg: Register, f: impl FnOnce(i32) -> i32) {
        let slot = &mut self.values[reg.index()];
        *slot = f(*slot);
    }

    /// Values of A, B, C, D in that order.
    pub fn snapshot(&self) -> [i32; 4] {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Register::parse("a"), Some(Register::A));
        assert_eq!(Register::parse("D"), Some(Register::D));
        assert_eq!(Register::parse("e"), None);
        assert_eq!(Register::parse("ab"), None);
        assert_eq!(Register::parse(""), None);
    }

    #[test]
    fn test_registers_start_zeroed() {
        let regs = RegisterFile::new();
        for reg in Register::ALL {
            assert_eq!(regs.get(reg), 0);
        }
    }

    #[test]
    fn test_registers_do_not_alias() {
        let mut regs = RegisterFile::new();
        regs.set(Register::B, 7);
        regs.update(Register::C, |v| v - 3);

        assert_eq!(regs.snapshot(), [0, 7, -3, 0]);
    }

    #[test]
    fn test_reset() {
        let mut regs = RegisterFile::new();
        regs.set(Register::A, 42);
        regs.reset();
        assert_eq!(regs.get(Register::A), 0);
    }
}
