//! Instruction set and decoder.
//!
//! Decoding turns a tokenized line into an [`Instruction`]. Operand problems
//! are reported as [`OperandError`]s carrying the source line, so a program
//! can still load when a line it never reaches is malformed.

use crate::asm::tokenizer::Tokens;
use crate::vm::{Comparator, Register};
use serde::{Serialize, Deserialize};
use std::fmt;
use thiserror::Error;

/// A source operand: a register or an integer literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    Register(Register),
    Immediate(i32),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(reg) => write!(f, "{}", reg),
            Operand::Immediate(value) => write!(f, "{}", value),
        }
    }
}

/// Jump condition, tested against the [`Comparator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    Always,
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
}

impl Condition {
    /// Check whether a jump with this condition is taken.
    ///
    /// The negated conditions (`jne`, `jge`, `jle`) only fail on the
    /// outcome they exclude, so they are taken while the comparator is unset.
    pub fn holds(self, comparator: Comparator) -> bool {
        use Comparator::*;
        match self {
            Condition::Always => true,
            Condition::Equal => comparator == Equal,
            Condition::NotEqual => comparator != Equal,
            Condition::Greater => comparator == Greater,
            Condition::GreaterEqual => comparator != Less,
            Condition::Less => comparator == Less,
            Condition::LessEqual => comparator != Greater,
        }
    }

    /// The jump mnemonic for this condition.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Condition::Always => "jmp",
            Condition::Equal => "je",
            Condition::NotEqual => "jne",
            Condition::Greater => "jg",
            Condition::GreaterEqual => "jge",
            Condition::Less => "jl",
            Condition::LessEqual => "jle",
        }
    }
}

/// Decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    // ==================== Data ====================

    /// dst := src
    Mov { dst: Register, src: Operand },
    /// dst := dst + 1
    Inc { dst: Register },
    /// dst := dst - 1
    Dec { dst: Register },
    /// dst := dst + src
    Add { dst: Register, src: Operand },
    /// dst := dst - src
    Sub { dst: Register, src: Operand },
    /// dst := dst * src
    Mul { dst: Register, src: Operand },
    /// dst := dst / src, truncating; fails on zero
    Div { dst: Register, src: Operand },
    /// Comparator := lhs vs rhs
    Cmp { lhs: Register, rhs: Operand },
    /// Emit the register's value
    Prnt { src: Register },

    // ==================== Control Flow ====================

    /// Jump to `label` if `cond` holds
    Jump { cond: Condition, label: String },
    /// Push the return location and jump to `label`
    Call { label: String },
    /// Pop a return location and jump to it
    Ret,
    /// Stop the program
    End,
}

impl Instruction {
    /// The label this instruction transfers control to, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            Instruction::Jump { label, .. } | Instruction::Call { label } => Some(label),
            _ => None,
        }
    }

    /// Check whether this instruction can change the program counter
    /// other than by advancing it.
    pub fn is_control_flow(&self) -> bool {
        matches!(
            self,
            Instruction::Jump { .. } | Instruction::Call { .. } | Instruction::Ret | Instruction::End
        )
    }
}

/// Decode a tokenized line found on source line `line`.
pub fn decode(tokens: &Tokens<'_>, line: usize) -> Result<Instruction, OperandError> {
    let mnemonic = tokens.mnemonic.to_ascii_lowercase();

    let instr = match mnemonic.as_str() {
        "mov" => Instruction::Mov {
            dst: register(tokens, 0, line)?,
            src: source(tokens, line)?,
        },
        "inc" => Instruction::Inc { dst: register(tokens, 0, line)? },
        "dec" => Instruction::Dec { dst: register(tokens, 0, line)? },
        "add" => Instruction::Add {
            dst: register(tokens, 0, line)?,
            src: source(tokens, line)?,
        },
        "sub" => Instruction::Sub {
            dst: register(tokens, 0, line)?,
            src: source(tokens, line)?,
        },
        "mul" => Instruction::Mul {
            dst: register(tokens, 0, line)?,
            src: source(tokens, line)?,
        },
        "div" => Instruction::Div {
            dst: register(tokens, 0, line)?,
            src: source(tokens, line)?,
        },
        "cmp" => Instruction::Cmp {
            lhs: register(tokens, 0, line)?,
            rhs: source(tokens, line)?,
        },
        "prnt" => Instruction::Prnt { src: register(tokens, 0, line)? },

        "jmp" => jump(Condition::Always, tokens, line)?,
        "je" => jump(Condition::Equal, tokens, line)?,
        "jne" => jump(Condition::NotEqual, tokens, line)?,
        "jg" => jump(Condition::Greater, tokens, line)?,
        "jge" => jump(Condition::GreaterEqual, tokens, line)?,
        "jl" => jump(Condition::Less, tokens, line)?,
        "jle" => jump(Condition::LessEqual, tokens, line)?,
        "call" => Instruction::Call { label: required(tokens, 0, line)?.to_string() },
        "ret" => Instruction::Ret,
        "end" => Instruction::End,

        _ => return Err(OperandError::UnknownMnemonic {
            line,
            mnemonic: tokens.mnemonic.to_string(),
        }),
    };

    Ok(instr)
}

fn required<'a>(tokens: &Tokens<'a>, position: usize, line: usize) -> Result<&'a str, OperandError> {
    tokens.operand(position).ok_or_else(|| OperandError::MissingOperand {
        line,
        mnemonic: tokens.mnemonic.to_string(),
        position: position + 1,
    })
}

fn register(tokens: &Tokens<'_>, position: usize, line: usize) -> Result<Register, OperandError> {
    let token = required(tokens, position, line)?;
    Register::parse(token).ok_or_else(|| OperandError::UnknownRegister {
        line,
        token: token.to_string(),
    })
}

/// Second operand: a register name wins over a numeric parse.
fn source(tokens: &Tokens<'_>, line: usize) -> Result<Operand, OperandError> {
    let token = required(tokens, 1, line)?;
    if let Some(reg) = Register::parse(token) {
        return Ok(Operand::Register(reg));
    }
    token
        .parse::<i32>()
        .map(Operand::Immediate)
        .map_err(|_| OperandError::InvalidLiteral {
            line,
            token: token.to_string(),
        })
}

fn jump(cond: Condition, tokens: &Tokens<'_>, line: usize) -> Result<Instruction, OperandError> {
    let label = required(tokens, 0, line)?.to_string();
    Ok(Instruction::Jump { cond, label })
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Mov { dst, src } => write!(f, "mov {}, {}", dst, src),
            Instruction::Inc { dst } => write!(f, "inc {}", dst),
            Instruction::Dec { dst } => write!(f, "dec {}", dst),
            Instruction::Add { dst, src } => write!(f, "add {}, {}", dst, src),
            Instruction::Sub { dst, src } => write!(f, "sub {}, {}", dst, src),
            Instruction::Mul { dst, src } => write!(f, "mul {}, {}", dst, src),
            Instruction::Div { dst, src } => write!(f, "div {}, {}", dst, src),
            Instruction::Cmp { lhs, rhs } => write!(f, "cmp {}, {}", lhs, rhs),
            Instruction::Prnt { src } => write!(f, "prnt {}", src),
            Instruction::Jump { cond, label } => write!(f, "{} {}", cond.mnemonic(), label),
            Instruction::Call { label } => write!(f, "call {}", label),
            Instruction::Ret => f.write_str("ret"),
            Instruction::End => f.write_str("end"),
        }
    }
}

/// Errors produced while decoding an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperandError {
    #[error("unknown command {mnemonic} at line {line}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("{mnemonic} is missing operand {position} at line {line}")]
    MissingOperand { line: usize, mnemonic: String, position: usize },

    #[error("unknown register {token} at line {line}")]
    UnknownRegister { line: usize, token: String },

    #[error("invalid integer literal {token} at line {line}")]
    InvalidLiteral { line: usize, token: String },
}

impl OperandError {
    /// Source line the error was found on.
    pub fn line(&self) -> usize {
        match self {
            OperandError::UnknownMnemonic { line, .. }
            | OperandError::MissingOperand { line, .. }
            | OperandError::UnknownRegister { line, .. }
            | OperandError::InvalidLiteral { line, .. } => *line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::tokenizer::{tokenize, Line};

    fn decode_line(text: &str) -> Result<Instruction, OperandError> {
        match tokenize(text) {
            Line::Instruction(tokens) => decode(&tokens, 1),
            other => panic!("expected instruction, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_data_instructions() {
        assert_eq!(
            decode_line("mov a, 5").unwrap(),
            Instruction::Mov { dst: Register::A, src: Operand::Immediate(5) }
        );
        assert_eq!(
            decode_line("ADD b, C").unwrap(),
            Instruction::Add { dst: Register::B, src: Operand::Register(Register::C) }
        );
        assert_eq!(
            decode_line("sub d, -12").unwrap(),
            Instruction::Sub { dst: Register::D, src: Operand::Immediate(-12) }
        );
        assert_eq!(decode_line("prnt a").unwrap(), Instruction::Prnt { src: Register::A });
    }

    #[test]
    fn test_decode_control_flow() {
        assert_eq!(
            decode_line("JGE loop").unwrap(),
            Instruction::Jump { cond: Condition::GreaterEqual, label: "loop".into() }
        );
        assert_eq!(decode_line("call sub").unwrap(), Instruction::Call { label: "sub".into() });
        assert_eq!(decode_line("ret").unwrap(), Instruction::Ret);
        assert_eq!(decode_line("End").unwrap(), Instruction::End);
    }

    #[test]
    fn test_unary_ignores_surplus_operand() {
        assert_eq!(decode_line("inc a, 9").unwrap(), Instruction::Inc { dst: Register::A });
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            decode_line("mov a"),
            Err(OperandError::MissingOperand { position: 2, .. })
        ));
        assert!(matches!(
            decode_line("inc"),
            Err(OperandError::MissingOperand { position: 1, .. })
        ));
        assert!(matches!(decode_line("inc x"), Err(OperandError::UnknownRegister { .. })));
        assert!(matches!(decode_line("add a, 12z"), Err(OperandError::InvalidLiteral { .. })));
        assert!(matches!(decode_line("jx loop"), Err(OperandError::UnknownMnemonic { .. })));
        assert!(matches!(decode_line("jmp"), Err(OperandError::MissingOperand { .. })));
    }

    #[test]
    fn test_literal_out_of_range() {
        assert!(matches!(
            decode_line("mov a, 99999999999"),
            Err(OperandError::InvalidLiteral { .. })
        ));
    }

    #[test]
    fn test_condition_table() {
        use Comparator::*;
        let cases = [
            (Condition::Equal, [false, true, false, false]),
            (Condition::NotEqual, [true, false, true, true]),
            (Condition::Greater, [false, false, true, false]),
            (Condition::GreaterEqual, [true, true, true, false]),
            (Condition::Less, [false, false, false, true]),
            (Condition::LessEqual, [true, true, false, true]),
            (Condition::Always, [true, true, true, true]),
        ];
        for (cond, expected) in cases {
            for (cmp, want) in [Unset, Equal, Greater, Less].into_iter().zip(expected) {
                assert_eq!(cond.holds(cmp), want, "{:?} with {:?}", cond, cmp);
            }
        }
    }

    #[test]
    fn test_listing() {
        for text in ["mov A, 5", "cmp B, C", "jle done", "call sub", "ret", "end"] {
            assert_eq!(decode_line(text).unwrap().to_string(), text);
        }
    }
}
