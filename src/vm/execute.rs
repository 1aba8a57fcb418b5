//! Execution engine.
//!
//! Implements the fetch-execute cycle over a loaded [`Program`] and all
//! instruction behaviors.

use crate::asm::Program;
use crate::vm::instruction::{Instruction, Operand, OperandError};
use crate::vm::stack::Frame;
use crate::vm::{CallStack, Comparator, Register, RegisterFile};
use serde::{Serialize, Deserialize};
use std::fmt;
use thiserror::Error;

/// How a machine stopped running normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndKind {
    /// An `end` instruction ran.
    Explicit,
    /// Execution ran past the last instruction.
    Exhausted,
}

/// Machine execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineState {
    /// Machine is running normally.
    Running,
    /// Machine has stopped without error.
    Ended(EndKind),
    /// Machine hit a fatal error.
    Faulted,
}

/// What an executed instruction did beyond its register effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Registers only.
    None,
    /// `prnt` emitted a value.
    Print(i32),
    /// `cmp` set the comparator.
    Compared(Comparator),
    /// A jump was taken.
    Jump { label: String, target: usize },
    /// A conditional jump fell through.
    NotTaken,
    /// A subroutine was entered.
    Call { label: String, target: usize, depth: usize },
    /// A subroutine returned.
    Return { target: usize },
    /// `end` ran.
    End,
}

/// Record of one dispatched instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Index of the instruction.
    pub index: usize,
    /// Source line of the instruction.
    pub line: usize,
    pub instruction: Instruction,
    pub effect: Effect,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03} L{:<4} {:<18}", self.index, self.line, self.instruction.to_string())?;
        match &self.effect {
            Effect::None => Ok(()),
            Effect::Print(value) => write!(f, "> {}", value),
            Effect::Compared(cmp) => write!(f, "comparator = {}", cmp),
            Effect::Jump { label, target } => write!(f, "jumped to {} ({:03})", label, target),
            Effect::NotTaken => f.write_str("not taken"),
            Effect::Call { label, target, depth } => {
                write!(f, "called {} ({:03}), depth {}", label, target, depth)
            }
            Effect::Return { target } => write!(f, "returned to {:03}", target),
            Effect::End => f.write_str("end"),
        }
    }
}

/// The interpreter: one program plus all mutable execution state.
#[derive(Debug, Clone)]
pub struct Machine {
    program: Program,
    /// Register file.
    pub regs: RegisterFile,
    /// Result of the last `cmp`.
    pub comparator: Comparator,
    /// Pending returns.
    pub stack: CallStack,
    /// Index of the next instruction.
    pc: usize,
    /// Current execution state.
    pub state: MachineState,
    /// Instructions executed so far.
    pub steps: u64,
    /// Values emitted by `prnt`.
    output: Vec<i32>,
}

impl Machine {
    /// Create a machine ready to run `program` from its first instruction.
    pub fn new(program: Program) -> Self {
        let mut machine = Self {
            program,
            regs: RegisterFile::new(),
            comparator: Comparator::Unset,
            stack: CallStack::new(),
            pc: 0,
            state: MachineState::Running,
            steps: 0,
            output: Vec::new(),
        };
        machine.check_exhausted();
        machine
    }

    /// Reset all execution state, keeping the program.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.comparator = Comparator::Unset;
        self.stack.clear();
        self.pc = 0;
        self.state = MachineState::Running;
        self.steps = 0;
        self.output.clear();
        self.check_exhausted();
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Index of the next instruction to run.
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Values printed so far.
    pub fn output(&self) -> &[i32] {
        &self.output
    }

    /// Read a register.
    pub fn register(&self, reg: Register) -> i32 {
        self.regs.get(reg)
    }

    /// Execute a single instruction.
    ///
    /// On error the machine is left `Faulted` with nothing from the failing
    /// instruction committed.
    pub fn step(&mut self) -> Result<Step, MachineError> {
        if self.state != MachineState::Running {
            return Err(MachineError::NotRunning(self.state));
        }

        // Fetch
        let index = self.pc;
        let (line, decoded) = match self.program.get(index) {
            Some(stmt) => (stmt.line, stmt.instruction.as_ref()),
            None => {
                self.state = MachineState::Ended(EndKind::Exhausted);
                return Err(MachineError::NotRunning(self.state));
            }
        };

        let instruction = match decoded {
            Ok(instr) => instr.clone(),
            Err(e) => {
                let error = MachineError::from(e.clone());
                return Err(self.fault(error));
            }
        };

        // Execute
        let effect = match self.execute(&instruction, line) {
            Ok(effect) => effect,
            Err(e) => return Err(self.fault(e)),
        };

        self.steps += 1;
        self.check_exhausted();

        Ok(Step { index, line, instruction, effect })
    }

    /// Run until the machine ends or faults.
    ///
    /// Returns the number of instructions executed.
    pub fn run(&mut self) -> Result<u64, MachineError> {
        let start_steps = self.steps;

        while self.state == MachineState::Running {
            self.step()?;
        }

        Ok(self.steps - start_steps)
    }

    /// Run for at most `max_steps` instructions.
    pub fn run_limited(&mut self, max_steps: u64) -> Result<u64, MachineError> {
        let start_steps = self.steps;
        let limit = self.steps + max_steps;

        while self.state == MachineState::Running && self.steps < limit {
            self.step()?;
        }

        Ok(self.steps - start_steps)
    }

    /// Execute a decoded instruction found on `line`.
    fn execute(&mut self, instr: &Instruction, line: usize) -> Result<Effect, MachineError> {
        let effect = match instr {
            // ==================== Data ====================

            Instruction::Mov { dst, src } => {
                let value = self.value(*src);
                self.regs.set(*dst, value);
                Effect::None
            }

            Instruction::Inc { dst } => {
                self.regs.update(*dst, |v| v.wrapping_add(1));
                Effect::None
            }

            Instruction::Dec { dst } => {
                self.regs.update(*dst, |v| v.wrapping_sub(1));
                Effect::None
            }

            Instruction::Add { dst, src } => {
                let value = self.value(*src);
                self.regs.update(*dst, |v| v.wrapping_add(value));
                Effect::None
            }

            Instruction::Sub { dst, src } => {
                let value = self.value(*src);
                self.regs.update(*dst, |v| v.wrapping_sub(value));
                Effect::None
            }

            Instruction::Mul { dst, src } => {
                let value = self.value(*src);
                self.regs.update(*dst, |v| v.wrapping_mul(value));
                Effect::None
            }

            Instruction::Div { dst, src } => {
                let divisor = self.value(*src);
                if divisor == 0 {
                    return Err(MachineError::DivisionByZero { line });
                }
                self.regs.update(*dst, |v| v.wrapping_div(divisor));
                Effect::None
            }

            Instruction::Cmp { lhs, rhs } => {
                self.comparator = Comparator::compare(self.regs.get(*lhs), self.value(*rhs));
                Effect::Compared(self.comparator)
            }

            Instruction::Prnt { src } => {
                let value = self.regs.get(*src);
                self.output.push(value);
                Effect::Print(value)
            }

            // ==================== Control Flow ====================

            Instruction::Jump { cond, label } => {
                if cond.holds(self.comparator) {
                    let target = self.resolve(label, line)?;
                    self.pc = target;
                    Effect::Jump { label: label.clone(), target }
                } else {
                    self.pc += 1;
                    Effect::NotTaken
                }
            }

            Instruction::Call { label } => {
                let target = self.resolve(label, line)?;
                self.stack.push(Frame { return_to: self.pc + 1, call_line: line });
                self.pc = target;
                Effect::Call {
                    label: label.clone(),
                    target,
                    depth: self.stack.len(),
                }
            }

            Instruction::Ret => {
                let frame = self.stack.pop().ok_or(MachineError::EmptyCallStack { line })?;
                self.pc = frame.return_to;
                Effect::Return { target: frame.return_to }
            }

            Instruction::End => {
                self.state = MachineState::Ended(EndKind::Explicit);
                Effect::End
            }
        };

        if !instr.is_control_flow() {
            self.pc += 1;
        }
        Ok(effect)
    }

    /// Value of a source operand.
    fn value(&self, operand: Operand) -> i32 {
        match operand {
            Operand::Register(reg) => self.regs.get(reg),
            Operand::Immediate(value) => value,
        }
    }

    fn resolve(&self, label: &str, line: usize) -> Result<usize, MachineError> {
        self.program
            .labels()
            .resolve(label)
            .ok_or_else(|| MachineError::UnresolvedLabel { line, label: label.to_string() })
    }

    fn fault(&mut self, error: MachineError) -> MachineError {
        self.state = MachineState::Faulted;
        error
    }

    fn check_exhausted(&mut self) {
        if self.state == MachineState::Running && self.pc >= self.program.len() {
            self.state = MachineState::Ended(EndKind::Exhausted);
        }
    }

    /// Check if the machine is running.
    pub fn is_running(&self) -> bool {
        self.state == MachineState::Running
    }
}

/// Errors that can occur during execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    #[error("machine not running: {0:?}")]
    NotRunning(MachineState),

    #[error(transparent)]
    Operand(#[from] OperandError),

    #[error("cannot jump to label {label} at line {line}")]
    UnresolvedLabel { line: usize, label: String },

    #[error("division by zero at line {line}")]
    DivisionByZero { line: usize },

    #[error("cannot return from the subroutine at line {line}: call stack is empty")]
    EmptyCallStack { line: usize },
}

impl MachineError {
    /// Source line of the failing instruction, if there was one.
    pub fn line(&self) -> Option<usize> {
        match self {
            MachineError::NotRunning(_) => None,
            MachineError::Operand(e) => Some(e.line()),
            MachineError::UnresolvedLabel { line, .. }
            | MachineError::DivisionByZero { line }
            | MachineError::EmptyCallStack { line } => Some(*line),
        }
    }
}
