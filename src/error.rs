use std::{fmt, io, path::Path};

use miette::{miette, Report, Severity};

/// Error decoding an instruction from the instruction buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// Leading byte does not match any supported instruction pattern.
    Unrecognized { addr: u16, byte: u8 },
    /// Instruction starting at `addr` needs more bytes than remain in the buffer.
    Truncated { addr: u16, len: usize },
}

impl DecodeError {
    /// Whether decoding can resume at the next byte.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Unrecognized { .. })
    }

    /// Address of the first byte of the offending instruction.
    pub fn addr(&self) -> u16 {
        match self {
            Self::Unrecognized { addr, .. } | Self::Truncated { addr, .. } => *addr,
        }
    }
}

impl std::error::Error for DecodeError {}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrecognized { addr, byte } => {
                write!(f, "unrecognized byte 0x{:02x} at offset {}", byte, addr)
            }
            Self::Truncated { addr, len } => write!(
                f,
                "instruction at offset {} runs past the end of the {}-byte program",
                addr, len
            ),
        }
    }
}

// Loading errors

pub fn load_unreadable(path: &Path, e: io::Error) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::unreadable",
        help = "check that the path exists and is a readable file",
        "Could not read {}: {e}",
        path.display(),
    )
}

pub fn load_empty(path: &Path) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::empty",
        help = "provide a file containing assembled 8086 machine code",
        "File {} is empty",
        path.display(),
    )
}

pub fn load_too_large(path: &Path, len: usize, max: usize) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::too_large",
        help = format!("programs are limited to {max} bytes of instructions"),
        "File {} is {len} bytes long",
        path.display(),
    )
}

// Decoding errors

pub fn decode_truncated(err: DecodeError) -> Report {
    miette!(
        severity = Severity::Error,
        code = "decode::truncated",
        help = "the program may have been cut short, or a data byte was decoded as an opcode",
        "Decoding failed: {err}",
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn only_unrecognized_is_recoverable() {
        let unrecognized = DecodeError::Unrecognized { addr: 3, byte: 0x0f };
        let truncated = DecodeError::Truncated { addr: 7, len: 8 };
        assert!(unrecognized.is_recoverable());
        assert!(!truncated.is_recoverable());
        assert_eq!(unrecognized.addr(), 3);
        assert_eq!(truncated.addr(), 7);
    }

    #[test]
    fn messages() {
        assert_eq!(
            DecodeError::Unrecognized { addr: 3, byte: 0x0f }.to_string(),
            "unrecognized byte 0x0f at offset 3"
        );
        assert_eq!(
            DecodeError::Truncated { addr: 7, len: 8 }.to_string(),
            "instruction at offset 7 runs past the end of the 8-byte program"
        );
    }
}
