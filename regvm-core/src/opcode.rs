//! Instruction set
//!
//! Closed set of opcodes. `B` carries its condition in the mnemonic token
//! itself (`BEQ LOOP`), never as a separate operand.

use crate::store::Latch;

/// Branch condition, evaluated against the comparison latch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    Always,
    Eq,
    Ne,
    Lt,
    Gt,
}

impl Condition {
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Some(match suffix {
            "" => Self::Always,
            "EQ" => Self::Eq,
            "NE" => Self::Ne,
            "LT" => Self::Lt,
            "GT" => Self::Gt,
            _ => return None,
        })
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Always => "",
            Self::Eq => "EQ",
            Self::Ne => "NE",
            Self::Lt => "LT",
            Self::Gt => "GT",
        }
    }

    pub fn holds(self, latch: &Latch) -> bool {
        match self {
            Self::Always => true,
            Self::Eq => latch.left == latch.right,
            Self::Ne => latch.left != latch.right,
            Self::Lt => latch.left < latch.right,
            Self::Gt => latch.left > latch.right,
        }
    }
}

/// What each operand position accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandRole {
    /// Destination/source register token (`Rn`)
    Register,
    /// Immediate or register value
    Value,
    /// Memory address (value operand, optionally bracketed)
    Address,
    /// Label name
    Label,
}

/// Opcode categories, used for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeCategory {
    Memory,
    Arithmetic,
    Logic,
    Shift,
    Control,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Ldr,
    Str,
    Add,
    Sub,
    Mov,
    Cmp,
    And,
    Orr,
    Eor,
    Mvn,
    Lsl,
    Lsr,
    Branch(Condition),
    Halt,
}

impl Opcode {
    /// Every mnemonic the machine accepts
    pub const ALL: [Opcode; 18] = [
        Self::Ldr,
        Self::Str,
        Self::Add,
        Self::Sub,
        Self::Mov,
        Self::Cmp,
        Self::And,
        Self::Orr,
        Self::Eor,
        Self::Mvn,
        Self::Lsl,
        Self::Lsr,
        Self::Branch(Condition::Always),
        Self::Branch(Condition::Eq),
        Self::Branch(Condition::Ne),
        Self::Branch(Condition::Lt),
        Self::Branch(Condition::Gt),
        Self::Halt,
    ];

    /// Mnemonic lookup. Case-sensitive.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        Some(match mnemonic {
            "LDR" => Self::Ldr,
            "STR" => Self::Str,
            "ADD" => Self::Add,
            "SUB" => Self::Sub,
            "MOV" => Self::Mov,
            "CMP" => Self::Cmp,
            "AND" => Self::And,
            "ORR" => Self::Orr,
            "EOR" => Self::Eor,
            "MVN" => Self::Mvn,
            "LSL" => Self::Lsl,
            "LSR" => Self::Lsr,
            "HALT" => Self::Halt,
            other => {
                let suffix = other.strip_prefix('B')?;
                Self::Branch(Condition::from_suffix(suffix)?)
            }
        })
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::Ldr => "LDR",
            Self::Str => "STR",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mov => "MOV",
            Self::Cmp => "CMP",
            Self::And => "AND",
            Self::Orr => "ORR",
            Self::Eor => "EOR",
            Self::Mvn => "MVN",
            Self::Lsl => "LSL",
            Self::Lsr => "LSR",
            Self::Branch(Condition::Always) => "B",
            Self::Branch(Condition::Eq) => "BEQ",
            Self::Branch(Condition::Ne) => "BNE",
            Self::Branch(Condition::Lt) => "BLT",
            Self::Branch(Condition::Gt) => "BGT",
            Self::Halt => "HALT",
        }
    }

    pub fn operand_roles(&self) -> &'static [OperandRole] {
        use OperandRole::*;
        match self {
            Self::Ldr | Self::Str => &[Register, Address],
            Self::Add
            | Self::Sub
            | Self::And
            | Self::Orr
            | Self::Eor
            | Self::Lsl
            | Self::Lsr => &[Register, Value, Value],
            Self::Mov | Self::Mvn => &[Register, Value],
            Self::Cmp => &[Value, Value],
            Self::Branch(_) => &[Label],
            Self::Halt => &[],
        }
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.operand_roles().len()
    }

    pub fn category(&self) -> OpcodeCategory {
        match self {
            Self::Ldr | Self::Str => OpcodeCategory::Memory,
            Self::Add | Self::Sub | Self::Mov | Self::Cmp => OpcodeCategory::Arithmetic,
            Self::And | Self::Orr | Self::Eor | Self::Mvn => OpcodeCategory::Logic,
            Self::Lsl | Self::Lsr => OpcodeCategory::Shift,
            Self::Branch(_) | Self::Halt => OpcodeCategory::Control,
        }
    }

    /// One-line description, shown by `regvm info`
    pub fn summary(&self) -> &'static str {
        match self {
            Self::Ldr => "LDR Rd addr      Rd <- memory[addr]",
            Self::Str => "STR Rd addr      memory[addr] <- Rd",
            Self::Add => "ADD Rd Rn op2    Rd <- Rn + op2",
            Self::Sub => "SUB Rd Rn op2    Rd <- Rn - op2",
            Self::Mov => "MOV Rd op2       Rd <- op2",
            Self::Cmp => "CMP Rn op2       latch <- (Rn, op2)",
            Self::And => "AND Rd Rn op2    Rd <- Rn & op2",
            Self::Orr => "ORR Rd Rn op2    Rd <- Rn | op2",
            Self::Eor => "EOR Rd Rn op2    Rd <- Rn ^ op2",
            Self::Mvn => "MVN Rd op2       Rd <- !op2",
            Self::Lsl => "LSL Rd Rn op2    Rd <- Rn << op2",
            Self::Lsr => "LSR Rd Rn op2    Rd <- Rn >> op2",
            Self::Branch(Condition::Always) => "B label          always branch",
            Self::Branch(Condition::Eq) => "BEQ label        branch if left == right",
            Self::Branch(Condition::Ne) => "BNE label        branch if left != right",
            Self::Branch(Condition::Lt) => "BLT label        branch if left < right",
            Self::Branch(Condition::Gt) => "BGT label        branch if left > right",
            Self::Halt => "HALT             stop execution",
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}
