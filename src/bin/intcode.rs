// SPDX-FileCopyrightText: 2025 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Run an Intcode program interactively, using stdin and stdout for I/O

use std::fs::read_to_string;
use std::io::{Write, stderr, stdin, stdout};
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use intcode::ports::{AsciiLineInput, AsciiOutput, InputPort, LineInput, LineOutput, OutputPort};
use intcode::prelude::*;

#[derive(PartialEq, Clone, Copy, ValueEnum)]
enum IoMode {
    /// one decimal integer per line
    #[value(alias("int"))]
    Numeric,
    /// text, one ASCII character per int
    #[value(alias("text"))]
    Ascii,
}

const VERSION: &str = concat!(env!("CARGO_CRATE_NAME"), '-', env!("CARGO_PKG_VERSION"));

#[derive(Parser)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = VERSION)]
#[command(about = "Intcode machine runner", long_about = None)]
struct Args {
    #[arg(help = "File containing comma-separated Intcode")]
    source: PathBuf,
    #[arg(short, long, default_value = "numeric")]
    #[arg(help = "How stdin and stdout are translated to and from ints")]
    mode: IoMode,
    #[arg(short, long)]
    #[arg(help = "Print every executed instruction to stderr once the program stops")]
    trace: bool,
    #[arg(short = 'D', long = "dump")]
    #[arg(help = "Print the machine state to stderr once the program stops")]
    dump: bool,
}

fn run_with<I: InputPort, O: OutputPort>(
    code: Vec<i64>,
    input: I,
    output: O,
    args: &Args,
) -> anyhow::Result<()> {
    let mut machine = Machine::with_ports(code, input, output);
    if args.trace {
        machine.start_trace();
    }
    let result = machine.run();

    let mut err = stderr().lock();
    if let Some(trace) = machine.end_trace() {
        for instr in trace.0 {
            writeln!(err, "{instr}")?;
        }
    }
    if args.dump || result.is_err() {
        machine.write_state(&mut err)?;
    }

    match result? {
        Outcome::Halted(result) => {
            log::info!("halted with {result} at address 0");
            Ok(())
        }
        // stdin is blocking, so this only happens if a port misbehaves
        Outcome::Suspended => bail!("machine suspended awaiting input"),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let text = read_to_string(&args.source)
        .with_context(|| format!("failed to read {}", args.source.display()))?;
    let code = intcode::parse_program(&text)
        .with_context(|| format!("failed to parse {}", args.source.display()))?;

    let input = stdin().lock();
    match args.mode {
        IoMode::Numeric => run_with(
            code,
            LineInput::new(input),
            LineOutput::new(stdout()),
            &args,
        ),
        IoMode::Ascii => run_with(
            code,
            AsciiLineInput::new(input),
            AsciiOutput::new(stdout()),
            &args,
        ),
    }
}
