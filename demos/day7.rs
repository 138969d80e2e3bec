// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Advent of Code 2019 Day 7: chain five amplifiers and find the phase settings with the
//! strongest signal.
//!
//! Part 1 runs the amplifiers one after another. Part 2 wires them into a feedback loop with
//! channels, each amplifier on its own thread.

use std::sync::mpsc::channel;
use std::thread;

use intcode::ports::{ChannelInput, ChannelOutput};
use intcode::prelude::*;
use itertools::Itertools;

fn serial(template: &Machine, phases: &[i64]) -> i64 {
    phases.iter().fold(0, |signal, &phase| {
        let (output, outcome) = template
            .clone()
            .run_through_inputs([phase, signal])
            .expect("amplifier crashed");
        assert!(outcome.is_halted(), "amplifier wanted more input");
        output[0]
    })
}

fn feedback(code: &[i64], phases: &[i64]) -> i64 {
    let (senders, receivers): (Vec<_>, Vec<_>) = phases.iter().map(|_| channel()).unzip();
    for (tx, &phase) in senders.iter().zip(phases) {
        tx.send(phase).expect("amplifier hung up");
    }
    senders[0].send(0).expect("amplifier hung up");

    // the last amplifier reports here, and the signal gets forwarded to the first
    let (report_tx, report_rx) = channel();
    let outputs = senders.iter().skip(1).cloned().chain([report_tx]);

    let amps = receivers
        .into_iter()
        .zip(outputs)
        .map(|(rx, tx)| {
            let code = code.to_vec();
            thread::spawn(move || {
                Machine::with_ports(code, ChannelInput::blocking(rx), ChannelOutput::new(tx)).run()
            })
        })
        .collect_vec();

    let mut signal = None;
    for value in report_rx {
        signal = Some(value);
        // fails once the first amplifier halts, which is expected
        let _ = senders[0].send(value);
    }
    for amp in amps {
        let outcome = amp.join().expect("amplifier panicked");
        assert!(outcome.expect("amplifier crashed").is_halted());
    }
    signal.expect("no signal reached the thrusters")
}

fn main() {
    env_logger::init();
    let path = std::env::args_os().nth(1).expect("missing file name");
    let text = std::fs::read_to_string(path).expect("failed to read file");
    let code = intcode::parse_program(&text).expect("invalid intcode");
    let template = Machine::new(code.iter().copied());

    let part1 = (0..5)
        .permutations(5)
        .map(|phases| serial(&template, &phases))
        .max();
    println!("part 1: {}", part1.expect("no phase settings"));

    let part2 = (5..10)
        .permutations(5)
        .map(|phases| feedback(&code, &phases))
        .max();
    println!("part 2: {}", part2.expect("no phase settings"));
}
