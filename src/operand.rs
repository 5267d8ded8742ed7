use crate::decoder::cursor::Cursor;
use crate::error::DecodeError;
use crate::runtime::RegisterFile;
use crate::symbol::{EffectiveBase, Register, Width};

/// Addressing mode, the top two bits of a mod-reg-r/m byte.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    /// Memory with no displacement, or a direct address when `r/m` is 6
    Memory,
    /// Memory with a signed 8-bit displacement
    Memory8,
    /// Memory with a signed 16-bit displacement
    Memory16,
    /// Register to register
    Register,
}

impl Mode {
    pub fn from_field(field: u8) -> Self {
        match field & 0b11 {
            0 => Mode::Memory,
            1 => Mode::Memory8,
            2 => Mode::Memory16,
            3 => Mode::Register,
            _ => unreachable!("field was masked to two bits"),
        }
    }
}

/// Fields of a mod-reg-r/m byte.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ModRm {
    pub mode: Mode,
    /// Register field, or an opcode extension for immediate forms
    pub reg: u8,
    pub rm: u8,
}

impl ModRm {
    pub fn from_byte(byte: u8) -> Self {
        ModRm {
            mode: Mode::from_field(byte >> 6),
            reg: (byte >> 3) & 0b111,
            rm: byte & 0b111,
        }
    }

    /// Whether `mode` and `r/m` denote a direct 16-bit address.
    pub fn is_direct(&self) -> bool {
        self.mode == Mode::Memory && self.rm == 6
    }
}

/// Memory reference: base register expression plus displacement.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EffectiveAddress {
    /// `None` for a direct address
    pub base: Option<EffectiveBase>,
    /// Signed displacement, or the address itself when `base` is `None`
    pub disp: i16,
}

impl EffectiveAddress {
    pub fn direct(addr: u16) -> Self {
        EffectiveAddress {
            base: None,
            disp: addr as i16,
        }
    }

    /// Compute the address referred to, wrapping at 16 bits.
    pub fn address(&self, reg: &RegisterFile) -> u16 {
        let base = match self.base.map(EffectiveBase::registers) {
            None => 0,
            Some((base, None)) => reg.get(base),
            Some((base, Some(index))) => reg.get(base).wrapping_add(reg.get(index)),
        };
        base.wrapping_add(self.disp as u16)
    }
}

/// Immediate data, stored as raw bits of `width`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Immediate {
    pub value: u16,
    pub width: Width,
}

impl Immediate {
    /// Value interpreted as a signed integer of its width.
    pub fn signed(&self) -> i16 {
        match self.width {
            Width::Byte => self.value as u8 as i8 as i16,
            Width::Word => self.value as i16,
        }
    }
}

/// A resolved instruction operand.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Operand {
    Register(Register),
    Memory(EffectiveAddress),
    Immediate(Immediate),
}

impl Operand {
    pub fn as_memory(&self) -> Option<&EffectiveAddress> {
        match self {
            Operand::Memory(ea) => Some(ea),
            _ => None,
        }
    }
}

/// Resolve the `r/m` side of a mod-reg-r/m byte, reading any displacement from `cursor`.
pub fn resolve(cursor: &mut Cursor, mode: Mode, rm: u8, width: Width) -> Result<Operand, DecodeError> {
    let base = EffectiveBase::from_field(rm);
    let ea = match mode {
        Mode::Register => return Ok(Operand::Register(Register::from_field(width, rm))),
        Mode::Memory if rm & 0b111 == 6 => EffectiveAddress::direct(cursor.next_u16()?),
        Mode::Memory => EffectiveAddress {
            base: Some(base),
            disp: 0,
        },
        Mode::Memory8 => EffectiveAddress {
            base: Some(base),
            disp: cursor.next_i8()? as i16,
        },
        Mode::Memory16 => EffectiveAddress {
            base: Some(base),
            disp: cursor.next_i16()?,
        },
    };
    Ok(Operand::Memory(ea))
}

#[cfg(test)]
mod test {
    use super::*;

    fn resolve_bytes(mode: Mode, rm: u8, disp: &[u8]) -> Operand {
        let mut cursor = Cursor::new(disp, 0);
        let operand = resolve(&mut cursor, mode, rm, Width::Word).unwrap();
        assert_eq!(cursor.consumed() as usize, disp.len());
        operand
    }

    #[test]
    fn register_mode() {
        assert_eq!(
            resolve_bytes(Mode::Register, 3, &[]),
            Operand::Register(Register::Bx)
        );
        let mut cursor = Cursor::new(&[], 0);
        assert_eq!(
            resolve(&mut cursor, Mode::Register, 7, Width::Byte),
            Ok(Operand::Register(Register::Bh))
        );
    }

    #[test]
    fn direct_address() {
        assert_eq!(
            resolve_bytes(Mode::Memory, 6, &[0xe8, 0x03]),
            Operand::Memory(EffectiveAddress::direct(1000))
        );
    }

    #[test]
    fn displacements_are_signed_by_width() {
        for rm in 0..8 {
            let base = Some(EffectiveBase::from_field(rm));
            assert_eq!(
                resolve_bytes(Mode::Memory8, rm, &[0xff]),
                Operand::Memory(EffectiveAddress { base, disp: -1 })
            );
            assert_eq!(
                resolve_bytes(Mode::Memory8, rm, &[0x7f]),
                Operand::Memory(EffectiveAddress { base, disp: 127 })
            );
            assert_eq!(
                resolve_bytes(Mode::Memory16, rm, &[0xff, 0x00]),
                Operand::Memory(EffectiveAddress { base, disp: 255 })
            );
            assert_eq!(
                resolve_bytes(Mode::Memory16, rm, &[0x00, 0xff]),
                Operand::Memory(EffectiveAddress { base, disp: -256 })
            );
            if rm != 6 {
                assert_eq!(
                    resolve_bytes(Mode::Memory, rm, &[]),
                    Operand::Memory(EffectiveAddress { base, disp: 0 })
                );
            }
        }
    }

    #[test]
    fn missing_displacement_is_truncation() {
        let mut cursor = Cursor::new(&[0x12], 0);
        assert_eq!(
            resolve(&mut cursor, Mode::Memory16, 0, Width::Word),
            Err(DecodeError::Truncated { addr: 0, len: 1 })
        );
    }

    #[test]
    fn effective_address_computation() {
        let mut reg = RegisterFile::default();
        reg.set(Register::Bx, 1000);
        reg.set(Register::Bp, 2000);
        reg.set(Register::Si, 10);
        reg.set(Register::Di, 20);

        #[rustfmt::skip]
        let cases = [
            // (r/m, disp, expected)
            (0, 0, 1010),
            (1, 5, 1025),
            (2, -1, 2009),
            (3, 0, 2020),
            (4, 2, 12),
            (5, 0, 20),
            (6, -2000, 0),
            (7, -1001, 0xffff),
        ];
        for (rm, disp, expected) in cases {
            let ea = EffectiveAddress {
                base: Some(EffectiveBase::from_field(rm)),
                disp,
            };
            assert_eq!(ea.address(&reg), expected, "r/m {rm}, disp {disp}");
        }
        assert_eq!(EffectiveAddress::direct(0xfffe).address(&reg), 0xfffe);
    }

    #[test]
    fn modrm_fields() {
        let modrm = ModRm::from_byte(0b10_011_110);
        assert_eq!(modrm.mode, Mode::Memory16);
        assert_eq!(modrm.reg, 3);
        assert_eq!(modrm.rm, 6);
        assert!(!modrm.is_direct());
        assert!(ModRm::from_byte(0b00_000_110).is_direct());
    }

    #[test]
    fn immediate_sign() {
        let byte = Immediate { value: 0xf4, width: Width::Byte };
        let word = Immediate { value: 0xfff4, width: Width::Word };
        assert_eq!(byte.signed(), -12);
        assert_eq!(word.signed(), -12);
        assert_eq!(Immediate { value: 200, width: Width::Word }.signed(), 200);
    }
}
