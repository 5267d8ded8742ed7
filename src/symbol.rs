use std::fmt;

/// Operand width, selected by the `w` bit of most encodings.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Width {
    Byte,
    Word,
}

impl Width {
    pub fn from_bit(w: bool) -> Self {
        if w {
            Width::Word
        } else {
            Width::Byte
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Width::Byte => "byte",
            Width::Word => "word",
        }
    }

    /// Mask covering every bit of a value at this width.
    pub fn mask(self) -> u16 {
        match self {
            Width::Byte => 0x00FF,
            Width::Word => 0xFFFF,
        }
    }
}

/// Which part of a 16-bit register slot a [`Register`] refers to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Half {
    Full,
    Low,
    High,
}

/// Represents the general purpose registers, including the 8-bit views of the first four slots.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Register {
    Al,
    Cl,
    Dl,
    Bl,
    Ah,
    Ch,
    Dh,
    Bh,
    Ax,
    Cx,
    Dx,
    Bx,
    Sp,
    Bp,
    Si,
    Di,
}

impl Register {
    /// Word registers in storage order.
    pub const WORDS: [Register; 8] = [
        Register::Ax,
        Register::Cx,
        Register::Dx,
        Register::Bx,
        Register::Sp,
        Register::Bp,
        Register::Si,
        Register::Di,
    ];

    /// Look up the register named by a 3-bit `reg` or `r/m` field.
    ///
    /// Only the low three bits of `field` are considered.
    pub fn from_field(width: Width, field: u8) -> Self {
        use Register::*;
        match (width, field & 0b111) {
            (Width::Byte, 0) => Al,
            (Width::Byte, 1) => Cl,
            (Width::Byte, 2) => Dl,
            (Width::Byte, 3) => Bl,
            (Width::Byte, 4) => Ah,
            (Width::Byte, 5) => Ch,
            (Width::Byte, 6) => Dh,
            (Width::Byte, 7) => Bh,
            (Width::Word, 0) => Ax,
            (Width::Word, 1) => Cx,
            (Width::Word, 2) => Dx,
            (Width::Word, 3) => Bx,
            (Width::Word, 4) => Sp,
            (Width::Word, 5) => Bp,
            (Width::Word, 6) => Si,
            (Width::Word, 7) => Di,
            _ => unreachable!("field was masked to three bits"),
        }
    }

    /// Accumulator of the given width.
    pub fn accumulator(width: Width) -> Self {
        Self::from_field(width, 0)
    }

    /// Index of the 16-bit storage slot backing this register.
    pub fn index(self) -> usize {
        use Register::*;
        match self {
            Al | Ah | Ax => 0,
            Cl | Ch | Cx => 1,
            Dl | Dh | Dx => 2,
            Bl | Bh | Bx => 3,
            Sp => 4,
            Bp => 5,
            Si => 6,
            Di => 7,
        }
    }

    pub fn half(self) -> Half {
        use Register::*;
        match self {
            Al | Cl | Dl | Bl => Half::Low,
            Ah | Ch | Dh | Bh => Half::High,
            _ => Half::Full,
        }
    }

    pub fn width(self) -> Width {
        match self.half() {
            Half::Full => Width::Word,
            Half::Low | Half::High => Width::Byte,
        }
    }

    pub fn name(self) -> &'static str {
        use Register::*;
        match self {
            Al => "al",
            Cl => "cl",
            Dl => "dl",
            Bl => "bl",
            Ah => "ah",
            Ch => "ch",
            Dh => "dh",
            Bh => "bh",
            Ax => "ax",
            Cx => "cx",
            Dx => "dx",
            Bx => "bx",
            Sp => "sp",
            Bp => "bp",
            Si => "si",
            Di => "di",
        }
    }
}

/// Operation of the arithmetic group, selected by a 3-bit field.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ArithOp {
    Add,
    Or,
    Adc,
    Sbb,
    And,
    Sub,
    Xor,
    Cmp,
}

impl ArithOp {
    pub fn from_field(field: u8) -> Self {
        use ArithOp::*;
        match field & 0b111 {
            0 => Add,
            1 => Or,
            2 => Adc,
            3 => Sbb,
            4 => And,
            5 => Sub,
            6 => Xor,
            7 => Cmp,
            _ => unreachable!("field was masked to three bits"),
        }
    }

    pub fn mnemonic(self) -> &'static str {
        use ArithOp::*;
        match self {
            Add => "add",
            Or => "or",
            Adc => "adc",
            Sbb => "sbb",
            And => "and",
            Sub => "sub",
            Xor => "xor",
            Cmp => "cmp",
        }
    }
}

/// Condition of a `0111cccc` conditional jump.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum JumpCond {
    Jo,
    Jno,
    Jb,
    Jnb,
    Je,
    Jne,
    Jbe,
    Jnbe,
    Js,
    Jns,
    Jp,
    Jnp,
    Jl,
    Jnl,
    Jle,
    Jnle,
}

impl JumpCond {
    pub fn from_field(field: u8) -> Self {
        use JumpCond::*;
        match field & 0b1111 {
            0x0 => Jo,
            0x1 => Jno,
            0x2 => Jb,
            0x3 => Jnb,
            0x4 => Je,
            0x5 => Jne,
            0x6 => Jbe,
            0x7 => Jnbe,
            0x8 => Js,
            0x9 => Jns,
            0xA => Jp,
            0xB => Jnp,
            0xC => Jl,
            0xD => Jnl,
            0xE => Jle,
            0xF => Jnle,
            _ => unreachable!("field was masked to four bits"),
        }
    }

    pub fn mnemonic(self) -> &'static str {
        use JumpCond::*;
        match self {
            Jo => "jo",
            Jno => "jno",
            Jb => "jb",
            Jnb => "jnb",
            Je => "je",
            Jne => "jne",
            Jbe => "jbe",
            Jnbe => "jnbe",
            Js => "js",
            Jns => "jns",
            Jp => "jp",
            Jnp => "jnp",
            Jl => "jl",
            Jnl => "jnl",
            Jle => "jle",
            Jnle => "jnle",
        }
    }
}

/// Loop-family instruction of the `111000cc` opcodes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LoopKind {
    Loopnz,
    Loopz,
    Loop,
    Jcxz,
}

impl LoopKind {
    pub fn from_field(field: u8) -> Self {
        match field & 0b11 {
            0 => LoopKind::Loopnz,
            1 => LoopKind::Loopz,
            2 => LoopKind::Loop,
            3 => LoopKind::Jcxz,
            _ => unreachable!("field was masked to two bits"),
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            LoopKind::Loopnz => "loopnz",
            LoopKind::Loopz => "loopz",
            LoopKind::Loop => "loop",
            LoopKind::Jcxz => "jcxz",
        }
    }
}

/// Base register expression of a memory operand, selected by the `r/m` field.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EffectiveBase {
    BxSi,
    BxDi,
    BpSi,
    BpDi,
    Si,
    Di,
    Bp,
    Bx,
}

impl EffectiveBase {
    pub fn from_field(field: u8) -> Self {
        use EffectiveBase::*;
        match field & 0b111 {
            0 => BxSi,
            1 => BxDi,
            2 => BpSi,
            3 => BpDi,
            4 => Si,
            5 => Di,
            6 => Bp,
            7 => Bx,
            _ => unreachable!("field was masked to three bits"),
        }
    }

    /// Registers summed to form the base address.
    pub fn registers(self) -> (Register, Option<Register>) {
        use EffectiveBase::*;
        match self {
            BxSi => (Register::Bx, Some(Register::Si)),
            BxDi => (Register::Bx, Some(Register::Di)),
            BpSi => (Register::Bp, Some(Register::Si)),
            BpDi => (Register::Bp, Some(Register::Di)),
            Si => (Register::Si, None),
            Di => (Register::Di, None),
            Bp => (Register::Bp, None),
            Bx => (Register::Bx, None),
        }
    }
}

impl fmt::Display for EffectiveBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.registers() {
            (base, Some(index)) => write!(f, "{} + {}", base.name(), index.name()),
            (base, None) => write!(f, "{}", base.name()),
        }
    }
}
