// Decoding
mod decoder;
pub use decoder::{decode, decode_all, Direction, Encoding, InstrKind, Instruction, Operands};
mod operand;
pub use operand::{EffectiveAddress, Immediate, Mode, ModRm, Operand};
mod symbol;
pub use symbol::{ArithOp, EffectiveBase, Half, JumpCond, LoopKind, Register, Width};

// Running
mod runtime;
pub use runtime::{
    Effect, Flags, Halt, RegisterFile, RunOptions, RunState, Step, Unimplemented, MEMORY_SIZE,
    PROGRAM_MAX,
};
pub mod cycles;

// Printing
pub mod disasm;
mod output;
pub use output::{Output, Snapshot};

pub mod error;
pub use error::DecodeError;

pub mod env;
