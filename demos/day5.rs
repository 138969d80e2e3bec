// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Advent of Code 2019 Day 5: run the thermal environment diagnostics for a system ID.

use intcode::prelude::*;

/// Every output but the last is a test result that must be 0. The last is the diagnostic code.
fn diagnose(template: &Machine, system_id: i64) -> i64 {
    let (mut outputs, outcome) = template
        .clone()
        .run_through_inputs([system_id])
        .expect("diagnostic program crashed");
    assert!(outcome.is_halted(), "diagnostic program wanted more input");
    let diagnostic = outputs.pop().expect("no diagnostic code");
    assert!(outputs.iter().all(|&i| i == 0), "failed checks: {outputs:?}");
    diagnostic
}

fn main() {
    let path = std::env::args_os().nth(1).expect("missing file name");
    let template: Machine = std::fs::read_to_string(path)
        .expect("failed to read file")
        .parse()
        .expect("invalid intcode");
    println!("part 1: {}", diagnose(&template, 1));
    println!("part 2: {}", diagnose(&template, 5));
}
