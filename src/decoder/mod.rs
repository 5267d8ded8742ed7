use crate::error::DecodeError;
use crate::operand::{resolve, EffectiveAddress, Immediate, ModRm, Operand};
use crate::symbol::{ArithOp, JumpCond, LoopKind, Register, Width};

use self::cursor::Cursor;

pub mod cursor;

/// What an instruction does, independent of how its operands are encoded.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InstrKind {
    Mov,
    Arith(ArithOp),
    Jump(JumpCond),
    Loop(LoopKind),
}

impl InstrKind {
    pub fn mnemonic(self) -> &'static str {
        match self {
            InstrKind::Mov => "mov",
            InstrKind::Arith(op) => op.mnemonic(),
            InstrKind::Jump(cond) => cond.mnemonic(),
            InstrKind::Loop(kind) => kind.mnemonic(),
        }
    }
}

/// Instruction class matched from the leading byte.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Encoding {
    /// `mod-reg-r/m`, register to or from register/memory
    RegMem,
    /// `mod-000-r/m` followed by data, immediate to register/memory
    ImmRegMem,
    /// `reg` in the opcode followed by data
    ImmReg,
    /// Accumulator to or from a direct address
    AccMem,
    /// Immediate to accumulator
    ImmAcc,
    /// Signed 8-bit displacement relative to the next instruction
    Relative,
}

/// Whether the `reg` field names the destination or the source.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    /// `d = 0`: register/memory is the destination
    FromReg,
    /// `d = 1`: the register is the destination
    ToReg,
}

impl Direction {
    pub fn from_bit(d: bool) -> Self {
        if d {
            Direction::ToReg
        } else {
            Direction::FromReg
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Operands {
    Pair { dest: Operand, src: Operand },
    Relative(i8),
}

/// Single decoded instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Instruction {
    /// Offset of the first byte in the instruction buffer
    pub addr: u16,
    /// Amount of bytes consumed
    pub len: u16,
    pub kind: InstrKind,
    pub encoding: Encoding,
    pub width: Width,
    pub direction: Direction,
    pub modrm: Option<ModRm>,
    pub operands: Operands,
}

impl Instruction {
    /// Offset of the following instruction.
    pub fn next_addr(&self) -> u16 {
        self.addr.wrapping_add(self.len)
    }

    /// Memory operand of the instruction, if any.
    pub fn memory_operand(&self) -> Option<&EffectiveAddress> {
        match &self.operands {
            Operands::Pair { dest, src } => dest.as_memory().or_else(|| src.as_memory()),
            Operands::Relative(_) => None,
        }
    }
}

/// Decode the instruction starting at offset `pc` of `program`.
pub fn decode(program: &[u8], pc: u16) -> Result<Instruction, DecodeError> {
    let mut cursor = Cursor::new(program, pc);
    let op = cursor.next_u8()?;
    let d = op & 0b10 != 0;
    let w = op & 0b1 != 0;

    let (kind, encoding, width, direction, modrm, operands) = if op >> 2 == 0b100010 {
        // mov r/m, reg
        let width = Width::from_bit(w);
        let direction = Direction::from_bit(d);
        let (modrm, operands) = reg_mem_operands(&mut cursor, width, direction)?;
        (InstrKind::Mov, Encoding::RegMem, width, direction, Some(modrm), operands)
    } else if op >> 1 == 0b1100011 {
        // mov r/m, imm
        let width = Width::from_bit(w);
        let modrm = ModRm::from_byte(cursor.next_u8()?);
        let dest = resolve(&mut cursor, modrm.mode, modrm.rm, width)?;
        let src = immediate(&mut cursor, width, false)?;
        let operands = Operands::Pair { dest, src };
        (InstrKind::Mov, Encoding::ImmRegMem, width, Direction::FromReg, Some(modrm), operands)
    } else if op >> 4 == 0b1011 {
        // mov reg, imm
        let width = Width::from_bit(op & 0b1000 != 0);
        let dest = Operand::Register(Register::from_field(width, op));
        let src = immediate(&mut cursor, width, false)?;
        let operands = Operands::Pair { dest, src };
        (InstrKind::Mov, Encoding::ImmReg, width, Direction::ToReg, None, operands)
    } else if op >> 2 == 0b101000 {
        // mov acc, [addr] / mov [addr], acc
        let width = Width::from_bit(w);
        let acc = Operand::Register(Register::accumulator(width));
        let mem = Operand::Memory(EffectiveAddress::direct(cursor.next_u16()?));
        let (direction, operands) = if d {
            (Direction::FromReg, Operands::Pair { dest: mem, src: acc })
        } else {
            (Direction::ToReg, Operands::Pair { dest: acc, src: mem })
        };
        (InstrKind::Mov, Encoding::AccMem, width, direction, None, operands)
    } else if op >> 6 == 0 && op & 0b100 == 0 {
        // op r/m, reg
        let kind = InstrKind::Arith(ArithOp::from_field(op >> 3));
        let width = Width::from_bit(w);
        let direction = Direction::from_bit(d);
        let (modrm, operands) = reg_mem_operands(&mut cursor, width, direction)?;
        (kind, Encoding::RegMem, width, direction, Some(modrm), operands)
    } else if op >> 2 == 0b100000 {
        // op r/m, imm
        let width = Width::from_bit(w);
        let modrm = ModRm::from_byte(cursor.next_u8()?);
        let kind = InstrKind::Arith(ArithOp::from_field(modrm.reg));
        let dest = resolve(&mut cursor, modrm.mode, modrm.rm, width)?;
        let src = immediate(&mut cursor, width, d)?;
        let operands = Operands::Pair { dest, src };
        (kind, Encoding::ImmRegMem, width, Direction::FromReg, Some(modrm), operands)
    } else if op >> 6 == 0 && (op >> 1) & 0b11 == 0b10 {
        // op acc, imm
        let kind = InstrKind::Arith(ArithOp::from_field(op >> 3));
        let width = Width::from_bit(w);
        let dest = Operand::Register(Register::accumulator(width));
        let src = immediate(&mut cursor, width, false)?;
        let operands = Operands::Pair { dest, src };
        (kind, Encoding::ImmAcc, width, Direction::ToReg, None, operands)
    } else if op >> 4 == 0b0111 {
        let kind = InstrKind::Jump(JumpCond::from_field(op));
        let operands = Operands::Relative(cursor.next_i8()?);
        (kind, Encoding::Relative, Width::Byte, Direction::FromReg, None, operands)
    } else if op >> 2 == 0b111000 {
        let kind = InstrKind::Loop(LoopKind::from_field(op));
        let operands = Operands::Relative(cursor.next_i8()?);
        (kind, Encoding::Relative, Width::Byte, Direction::FromReg, None, operands)
    } else {
        return Err(DecodeError::Unrecognized { addr: pc, byte: op });
    };

    Ok(Instruction {
        addr: pc,
        len: cursor.consumed(),
        kind,
        encoding,
        width,
        direction,
        modrm,
        operands,
    })
}

/// Lazily decode `program` front to back, without executing anything.
///
/// Unrecognized bytes are yielded as errors and skipped. The sequence ends after
/// a truncated instruction, or once offsets no longer fit the 16-bit program counter.
pub fn decode_all(program: &[u8]) -> impl Iterator<Item = Result<Instruction, DecodeError>> + '_ {
    let mut pc = 0usize;
    std::iter::from_fn(move || {
        if pc >= program.len() || pc > u16::MAX as usize {
            return None;
        }
        let result = decode(program, pc as u16);
        pc = match &result {
            Ok(instr) => pc + instr.len as usize,
            Err(err) if err.is_recoverable() => pc + 1,
            Err(_) => program.len(),
        };
        Some(result)
    })
}

fn reg_mem_operands(
    cursor: &mut Cursor,
    width: Width,
    direction: Direction,
) -> Result<(ModRm, Operands), DecodeError> {
    let modrm = ModRm::from_byte(cursor.next_u8()?);
    let reg = Operand::Register(Register::from_field(width, modrm.reg));
    let rm = resolve(cursor, modrm.mode, modrm.rm, width)?;
    let operands = match direction {
        Direction::ToReg => Operands::Pair { dest: reg, src: rm },
        Direction::FromReg => Operands::Pair { dest: rm, src: reg },
    };
    Ok((modrm, operands))
}

fn immediate(cursor: &mut Cursor, width: Width, sign_extend: bool) -> Result<Operand, DecodeError> {
    let value = cursor.next_data(width, sign_extend)?;
    Ok(Operand::Immediate(Immediate { value, width }))
}
