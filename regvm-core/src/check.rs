//! Static program check
//!
//! Finds what a run would trip over, without running anything: unknown
//! opcodes, wrong operand counts, malformed operands, constant addresses out of
//! range, and branches to labels that are never defined. Under
//! [`LabelMode::Legacy`] it also warns about forward branches.

use crate::error::VmErrorKind;
use crate::instruction::Instruction;
use crate::labels::LabelMode;
use crate::opcode::{Opcode, OperandRole};
use crate::operand::{Operand, resolve_register_index, strip_brackets};
use crate::program::{LineKind, Program};
use crate::store::Address;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Program line index
    pub line: usize,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    fn error(line: usize, message: impl Into<String>) -> Self {
        Self { line, severity: Severity::Error, message: message.into() }
    }

    fn warning(line: usize, message: impl Into<String>) -> Self {
        Self { line, severity: Severity::Warning, message: message.into() }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}: {}", self.line + 1, self.severity, self.message)
    }
}

/// Check every line of `program`. Diagnostics come back in line order.
pub fn check_program(program: &Program, mode: LabelMode) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    // label → every line index defining it
    let mut definitions: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, kind) in program.classified() {
        if let LineKind::Label(name) = kind {
            definitions.entry(name).or_default().push(index);
        }
    }

    for (index, kind) in program.classified() {
        match kind {
            LineKind::Blank | LineKind::Comment => {}
            LineKind::Label(name) => {
                if definitions.get(name).is_some_and(|defs| defs[0] != index) {
                    diagnostics.push(Diagnostic::warning(
                        index,
                        format!("label `{name}` is defined more than once"),
                    ));
                }
            }
            LineKind::Instruction { mnemonic, operands } => {
                let instr = match Instruction::decode(mnemonic, operands) {
                    Ok(instr) => instr,
                    Err(kind) => {
                        diagnostics.push(Diagnostic::error(index, kind.to_string()));
                        continue;
                    }
                };
                check_operands(&instr, index, mode, &definitions, &mut diagnostics);
            }
        }
    }

    diagnostics
}

fn check_operands(
    instr: &Instruction<'_>,
    index: usize,
    mode: LabelMode,
    definitions: &HashMap<&str, Vec<usize>>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (role, &token) in instr.opcode.operand_roles().iter().zip(&instr.operands) {
        let result = match role {
            OperandRole::Register => resolve_register_index(token).map(|_| ()),
            OperandRole::Value => Operand::parse(token).map(|_| ()),
            OperandRole::Address => match Operand::parse(strip_brackets(token)) {
                Ok(Operand::Immediate(value)) => Address::new(value).map(|_| ()),
                Ok(Operand::Register(_)) => Ok(()),
                Err(kind) => Err(kind),
            },
            OperandRole::Label => {
                check_label(instr.opcode, token, index, mode, definitions, diagnostics);
                Ok(())
            }
        };

        if let Err(kind) = result {
            diagnostics.push(Diagnostic::error(index, kind.to_string()));
        }
    }
}

fn check_label(
    opcode: Opcode,
    label: &str,
    index: usize,
    mode: LabelMode,
    definitions: &HashMap<&str, Vec<usize>>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match definitions.get(label) {
        None => diagnostics.push(Diagnostic::error(
            index,
            VmErrorKind::UndefinedLabel(label.to_string()).to_string(),
        )),
        Some(defs) if mode == LabelMode::Legacy && defs.iter().all(|&d| d > index) => {
            diagnostics.push(Diagnostic::warning(
                index,
                format!(
                    "{opcode} to `{label}` is a forward branch; in legacy label mode it faults unless `{label}` was reached earlier"
                ),
            ));
        }
        Some(_) => {}
    }
}

/// True when no diagnostic is an error
pub fn is_clean(diagnostics: &[Diagnostic]) -> bool {
    !diagnostics.iter().any(Diagnostic::is_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(source: &str, mode: LabelMode) -> Vec<Diagnostic> {
        check_program(&Program::from_source("t", source), mode)
    }

    #[test]
    fn test_clean_program() {
        let diags = check(
            "// loop\nMOV R0 #1\nLOOP:\nADD R0 R0 #1\nCMP R0 #5\nBLT LOOP\nSTR R0 [#19]\nHALT",
            LabelMode::Legacy,
        );
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn test_reports_errors_per_line() {
        let diags = check(
            "NOP\nMOV R0\nADD R13 R0 #1\nSTR R0 #20\nLDR R0 [R1]\nCMP R0 five\nB NOWHERE",
            LabelMode::Prescan,
        );
        let lines: Vec<usize> = diags.iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![0, 1, 2, 3, 5, 6]);
        assert!(diags.iter().all(Diagnostic::is_error));
        assert!(!is_clean(&diags));
        assert!(diags[0].message.contains("unknown opcode"));
        assert!(diags[3].message.contains("out of bounds"));
        assert!(diags[5].message.contains("NOWHERE"));
    }

    #[test]
    fn test_forward_branch_warning_only_in_legacy() {
        let source = "B END\nMOV R0 #1\nEND:\nHALT";
        assert!(check(source, LabelMode::Prescan).is_empty());

        let diags = check(source, LabelMode::Legacy);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Warning);
        assert!(is_clean(&diags));
    }

    #[test]
    fn test_duplicate_label_warning() {
        let diags = check("A:\nHALT\nA:\nB A", LabelMode::Prescan);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].line, 2);
        assert_eq!(diags[0].to_string(), "line 3: warning: label `A` is defined more than once");
    }
}
