use crate::cycles;
use crate::decoder::{decode, InstrKind, Instruction, Operands};
use crate::error::DecodeError;
use crate::operand::Operand;
use crate::symbol::{ArithOp, Half, JumpCond, LoopKind, Register, Width};

/// Size of the flat data memory, separate from the instruction buffer.
pub const MEMORY_SIZE: usize = 0x10000;
/// Largest program that can be loaded into the instruction buffer.
pub const PROGRAM_MAX: usize = 1024;

/// 8x 16-bit register slots.
///
/// The 8-bit registers are views onto the low and high halves of the first four slots.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct RegisterFile {
    slots: [u16; 8],
}

impl RegisterFile {
    pub fn get(&self, reg: Register) -> u16 {
        let slot = self.slots[reg.index()];
        match reg.half() {
            Half::Full => slot,
            Half::Low => slot & 0x00FF,
            Half::High => slot >> 8,
        }
    }

    /// Write `value` to `reg`, truncated to its width. Writing a half leaves the other half intact.
    pub fn set(&mut self, reg: Register, value: u16) {
        let slot = &mut self.slots[reg.index()];
        *slot = match reg.half() {
            Half::Full => value,
            Half::Low => (*slot & 0xFF00) | (value & 0x00FF),
            Half::High => (*slot & 0x00FF) | ((value & 0x00FF) << 8),
        };
    }

    /// Raw value of storage slot `index`.
    pub fn slot(&self, index: usize) -> u16 {
        self.slots[index]
    }
}

/// Condition flags written by the arithmetic group.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Flags {
    pub sign: bool,
    pub zero: bool,
}

impl Flags {
    /// Flags for a 16-bit arithmetic result, regardless of operand width.
    pub fn from_result(result: u16) -> Self {
        Flags {
            sign: result & 0x8000 != 0,
            zero: result == 0,
        }
    }
}

/// Instruction semantics that are decoded and costed, but intentionally not executed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Unimplemented {
    /// `or`, `adc`, `sbb`, `and`, `xor`
    Arith(ArithOp),
    /// Every conditional jump except `jne`
    Jump(JumpCond),
    Loop(LoopKind),
}

/// State change caused by executing one instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Effect {
    /// Value copied, flags untouched
    Transfer,
    /// Result written back at operand width, flags set from all 16 bits
    Arithmetic { result: u16 },
    /// Flags set, destination untouched
    Compare { result: u16 },
    Branch { taken: bool },
    Unimplemented(Unimplemented),
}

/// Outcome of a single [`RunState::step`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Step {
    Executed {
        instr: Instruction,
        effect: Effect,
        cycles: u32,
    },
    /// Byte skipped to resynchronize
    Unrecognized { addr: u16, byte: u8 },
}

/// Why [`RunState::run`] returned.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Halt {
    /// Program counter left the instruction buffer
    EndOfProgram,
    /// `max_steps` instructions were executed
    StepLimit,
}

#[derive(Clone, Copy, Default, Debug)]
pub struct RunOptions {
    /// Stop after this many steps, for programs which never leave their loop
    pub max_steps: Option<u64>,
}

/// Represents complete machine state during a run.
pub struct RunState {
    /// Instruction buffer. Read-only once loaded.
    program: Vec<u8>,
    /// Data memory - 64KB in size.
    mem: Box<[u8]>,
    /// Program counter, an offset into `program`
    pc: u16,
    reg: RegisterFile,
    flags: Flags,
    /// Estimated cycles elapsed since the start of the run
    cycles: u64,
}

impl RunState {
    /// Load a program into a fresh machine.
    ///
    /// # Panics
    ///
    /// Panics if `raw` is longer than [`PROGRAM_MAX`] bytes. Callers loading untrusted input
    /// should check the length first.
    pub fn from_raw(raw: &[u8]) -> RunState {
        assert!(
            raw.len() <= PROGRAM_MAX,
            "program of {} bytes does not fit in the instruction buffer",
            raw.len()
        );
        RunState {
            program: raw.to_vec(),
            mem: vec![0; MEMORY_SIZE].into_boxed_slice(),
            pc: 0,
            reg: RegisterFile::default(),
            flags: Flags::default(),
            cycles: 0,
        }
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.reg
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn memory(&self) -> &[u8] {
        &self.mem
    }

    /// Whether the program counter has left the instruction buffer.
    pub fn is_finished(&self) -> bool {
        self.pc as usize >= self.program.len()
    }

    /// Run until the program counter leaves the instruction buffer.
    ///
    /// `on_step` observes each step after it has been applied.
    pub fn run<F>(&mut self, options: RunOptions, mut on_step: F) -> Result<Halt, DecodeError>
    where
        F: FnMut(&Step, &RunState),
    {
        let mut steps = 0u64;
        while !self.is_finished() {
            if options.max_steps.is_some_and(|max| steps >= max) {
                return Ok(Halt::StepLimit);
            }
            let step = self.step()?;
            on_step(&step, self);
            steps += 1;
        }
        Ok(Halt::EndOfProgram)
    }

    /// Decode and execute the instruction at the program counter.
    ///
    /// Unrecognized bytes are skipped; a truncated instruction leaves the state untouched.
    pub fn step(&mut self) -> Result<Step, DecodeError> {
        let instr = match decode(&self.program, self.pc) {
            Ok(instr) => instr,
            Err(DecodeError::Unrecognized { addr, byte }) => {
                self.pc = self.pc.wrapping_add(1);
                return Ok(Step::Unrecognized { addr, byte });
            }
            Err(err) => return Err(err),
        };
        // PC incremented before instruction is performed
        self.pc = instr.next_addr();
        let effect = self.execute(&instr);
        let cycles = cycles::estimate(&instr);
        self.cycles += cycles as u64;
        Ok(Step::Executed {
            instr,
            effect,
            cycles,
        })
    }

    fn execute(&mut self, instr: &Instruction) -> Effect {
        match (instr.kind, instr.operands) {
            (InstrKind::Mov, Operands::Pair { dest, src }) => {
                let value = self.read(src, instr.width);
                self.write(dest, instr.width, value);
                Effect::Transfer
            }
            (InstrKind::Arith(op), Operands::Pair { dest, src }) => {
                self.arith(op, dest, src, instr.width)
            }
            (InstrKind::Jump(cond), Operands::Relative(disp)) => self.jump(cond, disp),
            (InstrKind::Loop(kind), _) => Effect::Unimplemented(Unimplemented::Loop(kind)),
            (kind, operands) => unreachable!("decoder produced {kind:?} with {operands:?}"),
        }
    }

    fn arith(&mut self, op: ArithOp, dest: Operand, src: Operand, width: Width) -> Effect {
        let lhs = self.read(dest, width);
        let rhs = self.read(src, width);
        let result = match op {
            ArithOp::Add => lhs.wrapping_add(rhs),
            ArithOp::Sub | ArithOp::Cmp => lhs.wrapping_sub(rhs),
            ArithOp::Or | ArithOp::Adc | ArithOp::Sbb | ArithOp::And | ArithOp::Xor => {
                return Effect::Unimplemented(Unimplemented::Arith(op));
            }
        };
        // Byte operands are widened; a carry out of bit 7 survives into the flags
        self.flags = Flags::from_result(result);
        if op == ArithOp::Cmp {
            return Effect::Compare { result };
        }
        self.write(dest, width, result);
        Effect::Arithmetic { result }
    }

    fn jump(&mut self, cond: JumpCond, disp: i8) -> Effect {
        match cond {
            JumpCond::Jne => {
                let taken = !self.flags.zero;
                if taken {
                    self.pc = self.pc.wrapping_add(disp as i16 as u16);
                }
                Effect::Branch { taken }
            }
            _ => Effect::Unimplemented(Unimplemented::Jump(cond)),
        }
    }

    fn read(&self, operand: Operand, width: Width) -> u16 {
        match operand {
            Operand::Register(reg) => self.reg.get(reg),
            Operand::Memory(ea) => self.load(ea.address(&self.reg), width),
            Operand::Immediate(imm) => imm.value & width.mask(),
        }
    }

    fn write(&mut self, operand: Operand, width: Width, value: u16) {
        match operand {
            Operand::Register(reg) => self.reg.set(reg, value),
            Operand::Memory(ea) => {
                let addr = ea.address(&self.reg);
                self.store(addr, width, value);
            }
            Operand::Immediate(imm) => unreachable!("immediate {imm:?} used as destination"),
        }
    }

    /// Little-endian load; the high byte of a word at 0xFFFF wraps to address 0.
    pub fn load(&self, addr: u16, width: Width) -> u16 {
        let lo = self.mem[addr as usize] as u16;
        match width {
            Width::Byte => lo,
            Width::Word => lo | (self.mem[addr.wrapping_add(1) as usize] as u16) << 8,
        }
    }

    pub fn store(&mut self, addr: u16, width: Width, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.mem[addr as usize] = lo;
        if width == Width::Word {
            self.mem[addr.wrapping_add(1) as usize] = hi;
        }
    }
}
