use std::fmt::Write as _;
use std::str::Chars;

use colored::{ColoredString, Colorize};

use crate::disasm;
use crate::runtime::{Flags, RegisterFile, RunState, Step};
use crate::symbol::Register;

/// Prints listing lines and machine state.
///
/// Listing and final dump go to stdout; trace lines go to stderr.
#[derive(Clone, Copy, Debug, Default)]
pub struct Output {
    /// Drop decoration, suited for blackbox tests
    minimal: bool,
}

/// Machine state to compare against after the next step, for trace lines.
#[derive(Clone, Copy, Debug)]
pub struct Snapshot {
    reg: RegisterFile,
    flags: Flags,
    cycles: u64,
}

struct Decolored<'a> {
    chars: Chars<'a>,
}

impl Output {
    pub fn new(minimal: bool) -> Self {
        Output { minimal }
    }

    pub fn is_minimal(&self) -> bool {
        self.minimal
    }

    /// Listing text for a step, without a line ending.
    pub fn listing_line(step: &Step) -> String {
        match step {
            Step::Executed { instr, .. } => instr.to_string(),
            Step::Unrecognized { byte, .. } => disasm::unrecognized(*byte),
        }
    }

    pub fn print_step(&self, step: &Step) {
        let line = Self::listing_line(step);
        match step {
            Step::Unrecognized { .. } if !self.minimal => println!("{}", line.as_str().yellow()),
            _ => println!("{}", line),
        }
    }

    pub fn print_trace(&self, snapshot: &Snapshot, state: &RunState) {
        let line = snapshot.describe_changes(state);
        if self.minimal {
            eprintln!("{}", Decolored::new(&line).collect::<String>());
        } else {
            eprintln!("{}", ColoredString::from(line.as_str()).blue());
        }
    }

    pub fn print_registers(&self, state: &RunState) {
        let reg = state.registers();
        let flags = state.flags();
        if self.minimal {
            for register in Register::WORDS {
                println!("{}: {}", register, reg.get(register));
            }
            println!("ip: {}", state.pc());
            println!("sf: {}", flags.sign as u8);
            println!("zf: {}", flags.zero as u8);
            println!("cycles: {}", state.cycles());
            return;
        }

        println!("\x1b[2m┌──────────────────────────────┐\x1b[0m");
        println!("\x1b[2m│        \x1b[3mhex    uint     int\x1b[0m\x1b[2m │\x1b[0m");
        for register in Register::WORDS {
            let value = reg.get(register);
            println!(
                "\x1b[2m│\x1b[0m \x1b[1m{}\x1b[0m  0x{:04x}  {:-6}  {:-6} \x1b[2m│\x1b[0m",
                register, value, value, value as i16
            );
        }
        println!(
            "\x1b[2m│\x1b[0m \x1b[1mip\x1b[0m  0x{:04x}   \x1b[1mflags\x1b[0m {:<6} \x1b[2m│\x1b[0m",
            state.pc(),
            flag_letters(flags)
        );
        println!("\x1b[2m└──────────────────────────────┘\x1b[0m");
        println!("{:>12} {}", "Cycles".cyan(), state.cycles());
    }
}

impl Snapshot {
    pub fn take(state: &RunState) -> Self {
        Snapshot {
            reg: *state.registers(),
            flags: state.flags(),
            cycles: state.cycles(),
        }
    }

    /// Describe registers and flags which differ between the snapshot and `state`.
    pub fn describe_changes(&self, state: &RunState) -> String {
        let mut line = String::from("   ;");
        for (index, register) in Register::WORDS.into_iter().enumerate() {
            let before = self.reg.slot(index);
            let after = state.registers().slot(index);
            if before != after {
                let _ = write!(line, " {}:0x{:x}->0x{:x}", register, before, after);
            }
        }
        if self.flags != state.flags() {
            let _ = write!(
                line,
                " flags:{}->{}",
                flag_letters(self.flags),
                flag_letters(state.flags())
            );
        }
        let _ = write!(
            line,
            " \x1b[2mcycles:+{}={}\x1b[0m",
            state.cycles() - self.cycles,
            state.cycles()
        );
        line
    }
}

fn flag_letters(flags: Flags) -> String {
    let mut letters = String::new();
    if flags.sign {
        letters.push('S');
    }
    if flags.zero {
        letters.push('Z');
    }
    letters
}

impl<'a> Decolored<'a> {
    pub fn new(string: &'a str) -> Self {
        Self {
            chars: string.chars(),
        }
    }
}

impl<'a> Iterator for Decolored<'a> {
    type Item = char;
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(ch) = self.chars.next() {
            // Skip everything between '\x1b' and 'm' (inclusive)
            if ch == '\x1b' {
                while self.chars.next().is_some_and(|ch| ch != 'm') {}
                continue;
            }
            return Some(ch);
        }
        None
    }
}
