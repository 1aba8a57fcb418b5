//! Whole-program execution: load, run, report.

use crate::asm::{self, LoadError, LoadOptions};
use crate::vm::{Comparator, EndKind, Machine, MachineError, MachineState, Register};
use serde::{Serialize, Serializer};
use std::fmt;
use std::io::{self, Write};
use thiserror::Error;

/// What running off the end of the program without `end` counts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndPolicy {
    /// Only an explicit `end` succeeds.
    #[default]
    Strict,
    /// Running out of instructions succeeds too.
    Lenient,
}

/// Settings for a whole run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunConfig {
    /// Write the label table and a line per dispatched instruction.
    pub verbose: bool,
    pub load: LoadOptions,
    pub end_policy: EndPolicy,
    /// Stop after this many instructions, leaving the machine running.
    pub max_steps: Option<u64>,
}

/// Outcome of a run as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitStatus {
    Ended,
    Faulted,
    /// The step cap was reached first.
    Running,
}

impl ExitStatus {
    /// Process exit code.
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Ended => 0,
            ExitStatus::Faulted | ExitStatus::Running => 1,
        }
    }
}

/// Final state of a run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub a: i32,
    pub b: i32,
    pub c: i32,
    pub d: i32,
    pub comparator: Comparator,
    pub output: Vec<i32>,
    pub state: MachineState,
    pub steps: u64,
    /// Return locations still pending when the run stopped.
    pub pending_returns: usize,
    pub status: ExitStatus,
    #[serde(serialize_with = "serialize_fault")]
    pub fault: Option<MachineError>,
}

impl Report {
    fn new(machine: &Machine, fault: Option<MachineError>, policy: EndPolicy) -> Self {
        let status = match (machine.state, policy) {
            (MachineState::Ended(EndKind::Explicit), _) => ExitStatus::Ended,
            (MachineState::Ended(EndKind::Exhausted), EndPolicy::Lenient) => ExitStatus::Ended,
            (MachineState::Running, _) => ExitStatus::Running,
            _ => ExitStatus::Faulted,
        };
        Self {
            a: machine.register(Register::A),
            b: machine.register(Register::B),
            c: machine.register(Register::C),
            d: machine.register(Register::D),
            comparator: machine.comparator,
            output: machine.output().to_vec(),
            state: machine.state,
            steps: machine.steps,
            pending_returns: machine.stack.len(),
            status,
            fault,
        }
    }

    /// Register values in A, B, C, D order.
    pub fn registers(&self) -> [i32; 4] {
        [self.a, self.b, self.c, self.d]
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "A: {}, B: {}, C: {}, D: {}, COMP: {}",
            self.a, self.b, self.c, self.d, self.comparator
        )
    }
}

fn serialize_fault<S: Serializer>(fault: &Option<MachineError>, s: S) -> Result<S::Ok, S::Error> {
    match fault {
        Some(e) => s.serialize_some(&e.to_string()),
        None => s.serialize_none(),
    }
}

/// Load and run `source`, collecting output in the report.
pub fn execute(source: &str, config: &RunConfig) -> Result<Report, Error> {
    execute_to(source, config, &mut io::sink())
}

/// Load and run `source`, writing `prnt` output (and the trace when
/// `config.verbose` is set) to `out`.
///
/// Only load and I/O failures are errors; a fault during execution is part
/// of the returned report.
pub fn execute_to<W: Write>(source: &str, config: &RunConfig, out: &mut W) -> Result<Report, Error> {
    let program = asm::load_with(source, &config.load)?;

    if config.verbose {
        writeln!(out, "Labels:")?;
        for (name, label) in program.labels().sorted() {
            writeln!(out, " - {} -> {:03} (line {})", name, label.index, label.line)?;
        }
        writeln!(out)?;
        writeln!(out, "Instructions:")?;
    }

    let mut machine = Machine::new(program);
    let mut fault = None;
    let limit = config.max_steps.unwrap_or(u64::MAX);

    while machine.is_running() && machine.steps < limit {
        match machine.step() {
            Ok(step) => {
                if config.verbose {
                    writeln!(out, " {}", step)?;
                } else if let crate::vm::Effect::Print(value) = step.effect {
                    writeln!(out, " > {}", value)?;
                }
            }
            Err(e) => {
                fault = Some(e);
            }
        }
    }

    if config.verbose && machine.is_running() {
        writeln!(out, " - stopped after {} steps", machine.steps)?;
    }

    if config.verbose && !machine.stack.is_empty() {
        writeln!(out, " - discarding {} pending return point(s)", machine.stack.len())?;
    }

    Ok(Report::new(&machine, fault, config.end_policy))
}

/// Run `source` against stdout and report the final state.
///
/// Output, faults and the final register line go to stdout; load errors to
/// stderr.
pub fn run(source: &str, verbose: bool) -> ExitStatus {
    let config = RunConfig { verbose, ..RunConfig::default() };
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match execute_to(source, &config, &mut out) {
        Ok(report) => {
            if let Some(fault) = &report.fault {
                let _ = writeln!(out, "{}", fault);
            }
            let _ = writeln!(out, "{}", report);
            report.status
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitStatus::Faulted
        }
    }
}

/// Errors that stop a run before it produces a report.
#[derive(Debug, Error)]
pub enum Error {
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
