// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Advent of Code 2019 Day 2: restore the gravity assist program, then search for the
//! noun and verb that produce a target value.

use intcode::prelude::*;

/// Patch in `noun` and `verb`, run to completion, and report what's left at address 0
fn run_with(template: &Machine, noun: i64, verb: i64) -> i64 {
    let mut machine = template.clone();
    machine[1] = noun;
    machine[2] = verb;
    match machine.run_through_inputs([]) {
        Ok((output, Outcome::Halted(result))) => {
            assert!(output.is_empty(), "unexpected output: {output:?}");
            result
        }
        Ok((_, Outcome::Suspended)) => panic!("program asked for input"),
        Err(e) => panic!("program failed: {e}"),
    }
}

fn main() {
    let path = std::env::args_os().nth(1).expect("missing file name");
    let template: Machine = std::fs::read_to_string(path)
        .expect("failed to read file")
        .parse()
        .expect("invalid intcode");

    println!("part 1: {}", run_with(&template, 12, 2));

    #[allow(clippy::unreadable_literal, reason = "from Advent of Code")]
    let (noun, verb) = (0..=99)
        .flat_map(|noun| (0..=99).map(move |verb| (noun, verb)))
        .find(|&(noun, verb)| run_with(&template, noun, verb) == 19690720)
        .expect("no answer found for part 2");
    println!("part 2: {}", 100 * noun + verb);
}
