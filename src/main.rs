use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{bail, Result};

use sim86::disasm::unrecognized;
use sim86::{error, DecodeError, Halt, Output, RunOptions, RunState, Snapshot, PROGRAM_MAX};

/// sim86 decodes, disassembles and simulates a subset of the 8086 instruction set.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a binary file to simulate
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Simulate a binary file, printing each instruction and the final machine state
    Run {
        /// File of raw 8086 machine code
        name: PathBuf,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
        /// Stop after executing this many instructions [env: SIM86_MAX_STEPS]
        #[arg(long)]
        max_steps: Option<u64>,
    },
    /// Disassemble a binary file front to back, without executing it
    Disasm {
        /// File of raw 8086 machine code
        name: PathBuf,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
    },
}

fn main() -> miette::Result<()> {
    let args = Args::parse();

    miette::set_hook(Box::new(|_| {
        Box::new(miette::MietteHandlerOpts::new().context_lines(2).build())
    }))?;
    sim86::env::init()?;

    match args.command {
        Some(Command::Run {
            name,
            minimal,
            max_steps,
        }) => {
            let max_steps = max_steps.or_else(sim86::env::max_steps);
            run(&name, RunOptions { max_steps }, Output::new(minimal))
        }
        Some(Command::Disasm { name, minimal }) => disasm(&name, Output::new(minimal)),
        None => {
            let Some(path) = args.path else {
                bail!(
                    code = "args::missing",
                    help = "try `sim86 <FILE>` or `sim86 --help`",
                    "Expected a binary file to simulate"
                );
            };
            let max_steps = sim86::env::max_steps();
            run(&path, RunOptions { max_steps }, Output::new(false))
        }
    }
}

enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(output: Output, color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(output, color, left, &right);
}

fn message(output: Output, color: MsgColor, left: &str, right: &str) {
    if output.is_minimal() {
        return;
    }
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    eprintln!("{left:>12} {right}");
}

fn run(name: &Path, options: RunOptions, output: Output) -> Result<()> {
    file_message(output, MsgColor::Green, "Loading", name);
    let mut state = RunState::from_raw(&load(name)?);

    message(output, MsgColor::Green, "Running", "instruction stream");
    let trace = sim86::env::is_trace_enabled();
    let mut snapshot = Snapshot::take(&state);
    let result = state.run(options, |step, state| {
        output.print_step(step);
        if trace {
            output.print_trace(&snapshot, state);
            snapshot = Snapshot::take(state);
        }
    });

    output.print_registers(&state);
    match result {
        Ok(Halt::EndOfProgram) => {
            file_message(output, MsgColor::Green, "Completed", name);
            Ok(())
        }
        Ok(Halt::StepLimit) => {
            message(output, MsgColor::Cyan, "Stopped", "step limit reached");
            Ok(())
        }
        Err(err) => {
            message(output, MsgColor::Red, "Failed", "decoding stopped early");
            Err(error::decode_truncated(err))
        }
    }
}

fn disasm(name: &Path, output: Output) -> Result<()> {
    file_message(output, MsgColor::Green, "Loading", name);
    let program = load(name)?;

    message(output, MsgColor::Green, "Decoding", "instruction stream");
    println!("bits 16");
    for result in sim86::decode_all(&program) {
        match result {
            Ok(instr) => println!("{}", instr),
            Err(DecodeError::Unrecognized { byte, .. }) => println!("{}", unrecognized(byte)),
            Err(err) => return Err(error::decode_truncated(err)),
        }
    }
    file_message(output, MsgColor::Green, "Completed", name);
    Ok(())
}

/// Read the whole instruction buffer, which must be non-empty and fit in [`PROGRAM_MAX`] bytes.
fn load(name: &Path) -> Result<Vec<u8>> {
    let buffer = fs::read(name).map_err(|e| error::load_unreadable(name, e))?;
    if buffer.is_empty() {
        return Err(error::load_empty(name));
    }
    if buffer.len() > PROGRAM_MAX {
        return Err(error::load_too_large(name, buffer.len(), PROGRAM_MAX));
    }
    Ok(buffer)
}
