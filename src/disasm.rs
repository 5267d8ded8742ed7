//! Assembly text for decoded instructions.
//!
//! Output follows NASM syntax, so a listing of recognized instructions can be
//! assembled again.

use std::fmt;

use crate::decoder::{Instruction, Operands};
use crate::operand::{EffectiveAddress, Immediate, Operand};
use crate::symbol::Register;

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for EffectiveAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(base) = self.base else {
            return write!(f, "[{}]", self.disp as u16);
        };
        match self.disp {
            0 => write!(f, "[{}]", base),
            disp if disp < 0 => write!(f, "[{} - {}]", base, (disp as i32).abs()),
            disp => write!(f, "[{} + {}]", base, disp),
        }
    }
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.signed())
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(reg) => write!(f, "{}", reg),
            Operand::Memory(ea) => write!(f, "{}", ea),
            Operand::Immediate(imm) => write!(f, "{}", imm),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = self.kind.mnemonic();
        match self.operands {
            Operands::Relative(disp) => write!(f, "{} {}", mnemonic, disp),
            // Size is ambiguous without a register operand
            Operands::Pair {
                dest: dest @ Operand::Memory(_),
                src: Operand::Immediate(imm),
            } => write!(f, "{} {}, {} {}", mnemonic, dest, self.width.name(), imm),
            Operands::Pair { dest, src } => write!(f, "{} {}, {}", mnemonic, dest, src),
        }
    }
}

/// Listing line for a byte that does not start any supported instruction.
pub fn unrecognized(byte: u8) -> String {
    format!("; unrecognized byte 0x{:02x}", byte)
}
