//! Error types for the register machine

use crate::store::{MEMORY_SIZE, REGISTER_COUNT, Word};
use thiserror::Error;

/// Result type for a run
pub type VmResult<T> = Result<T, VmError>;

/// What went wrong while executing an instruction line.
///
/// Handlers and operand resolvers return this bare kind; the execution loop
/// attaches the machine state and turns it into a [`VmError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmErrorKind {
    /// Malformed operand token, register index out of range, or wrong operand count
    #[error("invalid operand `{token}`: {reason}")]
    InvalidOperand { token: String, reason: String },

    /// Resolved memory address outside the memory block
    #[error("memory address {address} out of bounds (0..{})", MEMORY_SIZE)]
    MemoryFault { address: Word },

    /// Branch target not present in the label table at branch time
    #[error("undefined label `{0}`")]
    UndefinedLabel(String),

    /// Mnemonic not in the instruction set
    #[error("unknown opcode `{0}`")]
    UnknownOpcode(String),

    /// Optional step budget exhausted
    #[error("step limit of {0} exceeded")]
    StepLimitExceeded(u64),
}

impl VmErrorKind {
    pub(crate) fn invalid_operand(token: &str, reason: impl Into<String>) -> Self {
        Self::InvalidOperand {
            token: token.to_string(),
            reason: reason.into(),
        }
    }
}

/// Fatal fault raised by a run, with the machine state at the moment of failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at line {}", .line + 1)]
pub struct VmError {
    /// Fault category
    pub kind: VmErrorKind,
    /// Index of the faulting program line
    pub line: usize,
    /// Program counter when the fault was raised (already advanced past `line`)
    pub pc: usize,
    /// Register file contents
    pub registers: [Word; REGISTER_COUNT],
    /// Memory contents
    pub memory: [Word; MEMORY_SIZE],
}

/// Failure to obtain program text from a loader. Raised before any execution.
#[derive(Debug, Error)]
pub enum LoadError {
    /// No program with that identifier
    #[error("program not found: {0}")]
    NotFound(String),

    /// The source exists but could not be read
    #[error("failed to read program `{id}`: {source}")]
    Io {
        id: String,
        #[source]
        source: std::io::Error,
    },
}
