//! Register file, memory block and comparison latch
//!
//! Words are `i64` with two's-complement wraparound. Register indices and
//! memory addresses are validated once, when a [`RegisterIndex`] or
//! [`Address`] is constructed; after that, store access cannot go out of range.

use crate::error::VmErrorKind;
use serde::{Deserialize, Serialize};

/// Machine word
pub type Word = i64;

/// Number of general purpose registers (R0-R12)
pub const REGISTER_COUNT: usize = 13;

/// Number of memory cells
pub const MEMORY_SIZE: usize = 20;

/// Validated register index in `0..REGISTER_COUNT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegisterIndex(usize);

impl RegisterIndex {
    pub fn new(index: usize) -> Result<Self, VmErrorKind> {
        if index < REGISTER_COUNT {
            Ok(Self(index))
        } else {
            Err(VmErrorKind::invalid_operand(
                &format!("R{index}"),
                format!("register index out of range (0..{REGISTER_COUNT})"),
            ))
        }
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for RegisterIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// Validated memory address in `0..MEMORY_SIZE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(usize);

impl Address {
    pub fn new(value: Word) -> Result<Self, VmErrorKind> {
        match usize::try_from(value) {
            Ok(addr) if addr < MEMORY_SIZE => Ok(Self(addr)),
            _ => Err(VmErrorKind::MemoryFault { address: value }),
        }
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

/// Last pair of values compared by `CMP`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Latch {
    pub left: Word,
    pub right: Word,
}

impl Latch {
    pub fn new(left: Word, right: Word) -> Self {
        Self { left, right }
    }
}

/// Register file + memory, zero-initialized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    registers: [Word; REGISTER_COUNT],
    memory: [Word; MEMORY_SIZE],
}

impl Store {
    pub fn new() -> Self {
        Self {
            registers: [0; REGISTER_COUNT],
            memory: [0; MEMORY_SIZE],
        }
    }

    #[inline]
    pub fn get_register(&self, index: RegisterIndex) -> Word {
        self.registers[index.0]
    }

    #[inline]
    pub fn set_register(&mut self, index: RegisterIndex, value: Word) {
        self.registers[index.0] = value;
    }

    #[inline]
    pub fn get_memory(&self, addr: Address) -> Word {
        self.memory[addr.0]
    }

    #[inline]
    pub fn set_memory(&mut self, addr: Address, value: Word) {
        self.memory[addr.0] = value;
    }

    pub fn registers(&self) -> &[Word; REGISTER_COUNT] {
        &self.registers
    }

    pub fn memory(&self) -> &[Word; MEMORY_SIZE] {
        &self.memory
    }

    /// Zero every register and memory cell
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_starts_zeroed() {
        let store = Store::new();
        assert!(store.registers().iter().all(|&r| r == 0));
        assert!(store.memory().iter().all(|&m| m == 0));
    }

    #[test]
    fn test_register_index_bounds() {
        assert!(RegisterIndex::new(0).is_ok());
        assert!(RegisterIndex::new(12).is_ok());
        assert!(matches!(
            RegisterIndex::new(13),
            Err(VmErrorKind::InvalidOperand { .. })
        ));
    }

    #[test]
    fn test_address_bounds() {
        assert_eq!(Address::new(0).unwrap().get(), 0);
        assert_eq!(Address::new(19).unwrap().get(), 19);
        assert_eq!(Address::new(20), Err(VmErrorKind::MemoryFault { address: 20 }));
        assert_eq!(Address::new(-1), Err(VmErrorKind::MemoryFault { address: -1 }));
    }

    #[test]
    fn test_register_and_memory_access() {
        let mut store = Store::new();
        let r3 = RegisterIndex::new(3).unwrap();
        let a7 = Address::new(7).unwrap();

        store.set_register(r3, -42);
        store.set_memory(a7, 99);

        assert_eq!(store.get_register(r3), -42);
        assert_eq!(store.get_memory(a7), 99);
        assert_eq!(store.memory()[7], 99);

        store.reset();
        assert_eq!(store.get_register(r3), 0);
    }
}
