// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Advent of Code 2019 Day 9: the BOOST program, which exercises relative mode and large
//! memory. Pass `--dump` after the file name to print the final machine state to stderr.

use intcode::prelude::*;

fn boost(template: &Machine, mode: i64, dump: bool) -> i64 {
    let mut machine = template.clone();
    let (output, outcome) = machine.run_through_inputs([mode]).unwrap_or_else(|e| {
        eprintln!("{}", machine.dump_state());
        panic!("BOOST crashed: {e}");
    });
    if dump {
        eprintln!("{}", machine.dump_state());
    }
    assert!(outcome.is_halted(), "intcode did not halt");
    // more than one output means some opcodes are broken, and the outputs say which
    assert_eq!(output.len(), 1, "{output:?}");
    output[0]
}

fn main() {
    let mut args = std::env::args_os().skip(1);
    let path = args.next().expect("missing file name");
    let dump = args.next().is_some_and(|arg| arg == "--dump");
    let template: Machine = std::fs::read_to_string(path)
        .expect("failed to read file")
        .parse()
        .expect("invalid intcode");
    println!("part 1: {}", boost(&template, 1, dump));
    println!("part 2: {}", boost(&template, 2, dump));
}
