//! Error types for regvm runtime

use regvm_core::{LoadError, VmError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Fault(#[from] VmError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("no program loaded")]
    NoProgram,
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
