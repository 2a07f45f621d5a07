//! Operand resolution
//!
//! Token grammar:
//!
//! ```text
//! immediate  := '#' ['+' | '-'] digits
//! register   := 'R' digits                 (0..13)
//! address    := immediate | register | '[' (immediate | register) ']'
//! ```

use crate::error::VmErrorKind;
use crate::store::{Address, RegisterIndex, Store, Word};

/// A parsed value operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Immediate(Word),
    Register(RegisterIndex),
}

impl Operand {
    /// Parse a token without touching machine state
    pub fn parse(token: &str) -> Result<Self, VmErrorKind> {
        if let Some(literal) = token.strip_prefix('#') {
            literal
                .parse::<Word>()
                .map(Self::Immediate)
                .map_err(|e| VmErrorKind::invalid_operand(token, format!("bad immediate: {e}")))
        } else if token.starts_with('R') {
            resolve_register_index(token).map(Self::Register)
        } else {
            Err(VmErrorKind::invalid_operand(
                token,
                "expected an immediate (#n) or a register (Rn)",
            ))
        }
    }

    #[inline]
    pub fn value(self, store: &Store) -> Word {
        match self {
            Self::Immediate(v) => v,
            Self::Register(r) => store.get_register(r),
        }
    }
}

/// `#n` → n, `Rn` → current value of register n
pub fn resolve_value(token: &str, store: &Store) -> Result<Word, VmErrorKind> {
    Operand::parse(token).map(|op| op.value(store))
}

/// `Rn` → validated register index
pub fn resolve_register_index(token: &str) -> Result<RegisterIndex, VmErrorKind> {
    let digits = token
        .strip_prefix('R')
        .ok_or_else(|| VmErrorKind::invalid_operand(token, "expected a register (Rn)"))?;

    let index = digits
        .parse::<usize>()
        .map_err(|_| VmErrorKind::invalid_operand(token, "bad register number"))?;

    RegisterIndex::new(index).map_err(|_| {
        VmErrorKind::invalid_operand(token, "register index out of range (0..13)")
    })
}

/// Resolve like [`resolve_value`], then require the result to be a valid address.
/// An optional `[...]` wrapper is accepted.
pub fn resolve_memory_address(token: &str, store: &Store) -> Result<Address, VmErrorKind> {
    let value = resolve_value(strip_brackets(token), store)?;
    Address::new(value)
}

pub(crate) fn strip_brackets(token: &str) -> &str {
    token
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .unwrap_or(token)
}
