//! Program loader.
//!
//! Loading makes a single pass over the source: label lines go into the
//! [`LabelTable`] at the index of the next instruction, instruction lines are
//! decoded and appended to the program. Nothing is executed. Decode failures
//! are kept on the statement and only become fatal if the statement runs.

use crate::asm::labels::{Label, LabelTable};
use crate::asm::tokenizer::{self, Line};
use crate::vm::instruction::{self, Instruction, OperandError};
use crate::vm::MachineError;
use thiserror::Error;

/// Default limit on the number of instructions in a program.
pub const MAX_INSTRUCTIONS: usize = 100;

/// Options controlling how source is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Maximum number of instructions accepted.
    pub max_instructions: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { max_instructions: MAX_INSTRUCTIONS }
    }
}

/// One instruction line of a loaded program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// 1-based source line.
    pub line: usize,
    /// Source text with the comment and surrounding whitespace removed.
    pub text: String,
    /// The decoded instruction, or why it could not be decoded.
    pub instruction: Result<Instruction, OperandError>,
}

/// A loaded program: instructions in order plus their labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    statements: Vec<Statement>,
    labels: LabelTable,
}

impl Program {
    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Statement> {
        self.statements.get(index)
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Every problem that would fault the program if the offending
    /// instruction ran: undecodable statements and unknown jump targets.
    pub fn diagnostics(&self) -> Vec<MachineError> {
        let mut problems = Vec::new();
        for stmt in &self.statements {
            match &stmt.instruction {
                Err(e) => problems.push(MachineError::Operand(e.clone())),
                Ok(instr) => {
                    if let Some(label) = instr.target() {
                        if self.labels.resolve(label).is_none() {
                            problems.push(MachineError::UnresolvedLabel {
                                line: stmt.line,
                                label: label.to_string(),
                            });
                        }
                    }
                }
            }
        }
        problems
    }

    /// Canonical listing: labels on their own lines, one instruction per
    /// line prefixed with its index.
    pub fn listing(&self) -> String {
        let mut output = String::new();
        for (index, stmt) in self.statements.iter().enumerate() {
            push_labels(&mut output, &self.labels, index);
            let text = match &stmt.instruction {
                Ok(instr) => instr.to_string(),
                Err(_) => format!("{}  ; ???", stmt.text),
            };
            output.push_str(&format!("{:03}:     {}\n", index, text));
        }
        push_labels(&mut output, &self.labels, self.statements.len());
        output
    }
}

fn push_labels(output: &mut String, labels: &LabelTable, index: usize) {
    for name in labels.names_at(index) {
        output.push_str(&format!("{}:\n", name));
    }
}

/// Load source with the default options.
pub fn load(source: &str) -> Result<Program, LoadError> {
    load_with(source, &LoadOptions::default())
}

/// Load source.
pub fn load_with(source: &str, options: &LoadOptions) -> Result<Program, LoadError> {
    let mut program = Program::default();

    for (line_idx, raw) in source.lines().enumerate() {
        let line = line_idx + 1;

        match tokenizer::tokenize(raw) {
            Line::Blank => {}

            Line::Label(name) => {
                if name.is_empty() || name.contains(tokenizer::is_delimiter) {
                    return Err(LoadError::InvalidLabel { line, name: name.to_string() });
                }
                let label = Label { index: program.statements.len(), line };
                program.labels.define(name, label)?;
            }

            Line::Instruction(tokens) => {
                if program.statements.len() == options.max_instructions {
                    return Err(LoadError::TooManyInstructions {
                        line,
                        limit: options.max_instructions,
                    });
                }
                program.statements.push(Statement {
                    line,
                    text: tokenizer::strip_comment(raw).trim().to_string(),
                    instruction: instruction::decode(&tokens, line),
                });
            }
        }
    }

    Ok(program)
}

/// Errors that stop a program from loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("cannot set a duplicate label {name} at line {line} (first defined at line {first_line})")]
    DuplicateLabel { name: String, line: usize, first_line: usize },

    #[error("instructions are too long: line {line} exceeds the limit of {limit} instructions")]
    TooManyInstructions { line: usize, limit: usize },

    #[error("invalid label name {name:?} at line {line}")]
    InvalidLabel { line: usize, name: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::Register;
    use crate::vm::instruction::Operand;

    #[test]
    fn test_load_simple() {
        let source = r#"
            ; Simple test program
            mov a, 5
            prnt a
            end
        "#;

        let program = load(source).unwrap();
        assert_eq!(program.len(), 3);
        assert!(program.labels().is_empty());
        assert_eq!(
            program.get(0).unwrap().instruction,
            Ok(Instruction::Mov { dst: Register::A, src: Operand::Immediate(5) })
        );
        assert_eq!(program.get(0).unwrap().line, 3);
    }

    #[test]
    fn test_label_indices() {
        let source = "start:\nmov a, 1\n\nloop:\ninc a\n; comment\nagain:\njmp loop\ndone:\n";

        let program = load(source).unwrap();
        assert_eq!(program.len(), 3);
        assert_eq!(program.labels().len(), 4);
        assert_eq!(program.labels().resolve("start"), Some(0));
        assert_eq!(program.labels().resolve("loop"), Some(1));
        assert_eq!(program.labels().resolve("again"), Some(2));
        assert_eq!(program.labels().resolve("done"), Some(3));
    }

    #[test]
    fn test_duplicate_label() {
        let source = "a:\ninc a\nb:\na:\nend";
        assert_eq!(
            load(source).unwrap_err(),
            LoadError::DuplicateLabel { name: "a".into(), line: 4, first_line: 1 }
        );
    }

    #[test]
    fn test_duplicate_label_rejected_even_if_unused() {
        let source = "end\nx:\nx:\n";
        assert!(matches!(load(source), Err(LoadError::DuplicateLabel { .. })));
    }

    #[test]
    fn test_invalid_label() {
        assert!(matches!(load(":\nend"), Err(LoadError::InvalidLabel { line: 1, .. })));
        assert!(matches!(load("my label:\nend"), Err(LoadError::InvalidLabel { .. })));
    }

    #[test]
    fn test_instruction_limit() {
        let options = LoadOptions { max_instructions: 3 };
        let ok = "inc a\ninc a\nlbl:\nend\n";
        assert!(load_with(ok, &options).is_ok());

        let too_long = "inc a\ninc a\ninc a\nend\n";
        assert_eq!(
            load_with(too_long, &options).unwrap_err(),
            LoadError::TooManyInstructions { line: 4, limit: 3 }
        );
    }

    #[test]
    fn test_default_limit() {
        let source = "inc a\n".repeat(MAX_INSTRUCTIONS);
        assert_eq!(load(&source).unwrap().len(), MAX_INSTRUCTIONS);

        let source = "inc a\n".repeat(MAX_INSTRUCTIONS + 1);
        assert!(load(&source).is_err());
    }

    #[test]
    fn test_bad_statement_still_loads() {
        let program = load("end\nfrob a\n").unwrap();
        assert_eq!(program.len(), 2);
        assert!(program.get(1).unwrap().instruction.is_err());
    }

    #[test]
    fn test_diagnostics() {
        let source = "jmp nowhere\nmov a\nhere:\ncall here\nend";
        let program = load(source).unwrap();
        let problems = program.diagnostics();

        assert_eq!(problems.len(), 2);
        assert_eq!(
            problems[0],
            MachineError::UnresolvedLabel { line: 1, label: "nowhere".into() }
        );
        assert!(matches!(problems[1], MachineError::Operand(OperandError::MissingOperand { line: 2, .. })));
    }

    #[test]
    fn test_listing() {
        let program = load("mov a,5 ; five\nloop:\ndec A\njne loop\nout:\n").unwrap();
        let listing = program.listing();
        assert_eq!(
            listing,
            "000:     mov A, 5\nloop:\n001:     dec A\n002:     jne loop\nout:\n"
        );
    }
}
