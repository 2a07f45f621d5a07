//! Decoded instruction line

use crate::error::VmErrorKind;
use crate::opcode::Opcode;

/// An instruction line with a known opcode and the right operand count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction<'a> {
    pub opcode: Opcode,
    /// Mnemonic token as written
    pub mnemonic: &'a str,
    pub operands: Vec<&'a str>,
}

impl<'a> Instruction<'a> {
    pub fn decode(mnemonic: &'a str, operands: Vec<&'a str>) -> Result<Self, VmErrorKind> {
        let opcode = Opcode::from_mnemonic(mnemonic)
            .ok_or_else(|| VmErrorKind::UnknownOpcode(mnemonic.to_string()))?;

        if operands.len() != opcode.arity() {
            return Err(VmErrorKind::invalid_operand(
                mnemonic,
                format!(
                    "{} expects {} operand(s), found {}",
                    opcode,
                    opcode.arity(),
                    operands.len()
                ),
            ));
        }

        Ok(Self { opcode, mnemonic, operands })
    }

    #[inline]
    pub fn operand(&self, index: usize) -> &'a str {
        self.operands[index]
    }
}

impl std::fmt::Display for Instruction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mnemonic)?;
        for op in &self.operands {
            write!(f, " {op}")?;
        }
        Ok(())
    }
}
