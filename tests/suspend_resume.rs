//! Test machines that stop for input and pick back up, alone and chained together.
// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

use std::io::Cursor;
use std::sync::mpsc::channel;
use std::thread;

use intcode::ports::{ChannelInput, ChannelOutput, LineInput, LineOutput, PortError};
use intcode::prelude::*;
use itertools::Itertools;

const AMPLIFIER: &str = "3,15,3,16,1002,16,10,16,1,16,15,15,4,15,99,0,0";

const FEEDBACK_AMPLIFIER: &str = "3,26,1001,26,-4,26,3,27,1002,27,2,27,1,27,26,27,4,27,1001,28,\
    -1,28,1005,28,6,99,0,0,5";

#[test]
fn suspend_then_resume() {
    let mut machine: Machine = "3,20,3,21,1,20,21,22,4,22,99".parse().unwrap();
    machine.queue_input([3]);
    assert_eq!(machine.run(), Ok(Outcome::Suspended));
    assert_eq!(machine.state(), State::Suspended);
    // stopped on the second IN instruction, and hasn't moved past it
    assert_eq!(machine.instr_ptr(), 2);
    assert!(machine.flush_output().is_empty());

    machine.queue_input([7]);
    assert_eq!(machine.run(), Ok(Outcome::Halted(3)));
    assert_eq!(machine.flush_output(), vec![10]);
    assert_eq!(machine.state(), State::Halted);
}

#[test]
fn missing_input_recoverable() {
    let mut machine = Machine::new([3, 0, 4, 0, 99]);
    for _ in 0..3 {
        assert_eq!(machine.run(), Ok(Outcome::Suspended));
        assert_eq!(machine.instr_ptr(), 0);
    }
    assert!(!machine.is_poisoned());
    assert_eq!(machine.run_through_inputs([5]), Ok((vec![5], Outcome::Halted(5))));
}

#[test]
fn clone_while_suspended() {
    let mut machine = Machine::new([3, 0, 102, 2, 0, 0, 4, 0, 99]);
    assert_eq!(machine.run(), Ok(Outcome::Suspended));
    let mut copy = machine.clone();
    assert_eq!(copy, machine);

    assert_eq!(machine.run_through_inputs([10]), Ok((vec![20], Outcome::Halted(20))));
    assert_eq!(copy.state(), State::Suspended);
    assert_eq!(copy.run_through_inputs([-4]), Ok((vec![-8], Outcome::Halted(-8))));
    assert_ne!(copy, machine);
}

#[test]
fn serial_amplifiers() {
    let template: Machine = AMPLIFIER.parse().unwrap();
    let signal = [4, 3, 2, 1, 0].into_iter().fold(0, |signal, phase| {
        let (output, outcome) = template
            .clone()
            .run_through_inputs([phase, signal])
            .unwrap();
        assert!(outcome.is_halted());
        output[0]
    });
    assert_eq!(signal, 43210);
}

#[test]
fn best_serial_phase_order() {
    let template: Machine = AMPLIFIER.parse().unwrap();
    let best = (0..5)
        .permutations(5)
        .map(|phases| {
            phases.into_iter().fold(0, |signal, phase| {
                template.clone().run_through_inputs([phase, signal]).unwrap().0[0]
            })
        })
        .max();
    assert_eq!(best, Some(43210));
}

/// Pass the signal around the loop by hand, relying on each amplifier suspending between rounds
#[test]
fn feedback_loop_single_thread() {
    let template: Machine = FEEDBACK_AMPLIFIER.parse().unwrap();
    let mut amps: Vec<Machine> = [9, 8, 7, 6, 5]
        .into_iter()
        .map(|phase| {
            let mut amp = template.clone();
            amp.queue_input([phase]);
            amp
        })
        .collect();

    let mut signal = 0;
    let mut rounds = 0;
    while amps[4].state() != State::Halted {
        for amp in &mut amps {
            let (output, _) = amp.run_through_inputs([signal]).unwrap();
            assert_eq!(output.len(), 1);
            signal = output[0];
        }
        rounds += 1;
    }
    assert_eq!(signal, 139_629_729);
    assert_eq!(rounds, 5);
    assert!(amps.iter().all(|amp| amp.state() == State::Halted));
}

/// Same loop, but each amplifier has its own thread and blocks on a channel
#[test]
fn feedback_loop_threaded() {
    let code = intcode::parse_program(FEEDBACK_AMPLIFIER).unwrap();
    let phases = [9, 8, 7, 6, 5];

    let (channels_tx, channels_rx): (Vec<_>, Vec<_>) = phases.iter().map(|_| channel()).unzip();
    for (tx, &phase) in channels_tx.iter().zip(&phases) {
        tx.send(phase).unwrap();
    }
    channels_tx[0].send(0).unwrap();

    // the last amplifier reports back here, so the final signal survives the first one halting
    let (report_tx, report_rx) = channel();
    let outputs = channels_tx
        .iter()
        .skip(1)
        .cloned()
        .chain([report_tx])
        .collect_vec();

    let handles = channels_rx
        .into_iter()
        .zip(outputs)
        .map(|(rx, tx)| {
            let code = code.clone();
            thread::spawn(move || {
                Machine::with_ports(code, ChannelInput::blocking(rx), ChannelOutput::new(tx)).run()
            })
        })
        .collect_vec();

    let mut last = None;
    for signal in report_rx {
        last = Some(signal);
        // once the first amplifier halts, its receiver is gone
        let _ = channels_tx[0].send(signal);
    }

    for handle in handles {
        assert!(handle.join().unwrap().unwrap().is_halted());
    }
    assert_eq!(last, Some(139_629_729));
}

#[test]
fn non_blocking_channel_suspends() {
    let (tx, rx) = channel();
    let (out_tx, out_rx) = channel();
    let mut machine = Machine::with_ports(
        [3, 0, 4, 0, 99],
        ChannelInput::non_blocking(rx),
        ChannelOutput::new(out_tx),
    );
    assert_eq!(machine.run(), Ok(Outcome::Suspended));
    tx.send(42).unwrap();
    assert_eq!(machine.run(), Ok(Outcome::Halted(42)));
    assert_eq!(out_rx.try_recv(), Ok(42));
}

#[test]
fn closed_ports_are_fatal() {
    let input = LineInput::new(Cursor::new("1\n"));
    let output = LineOutput::new(Vec::<u8>::new());
    let mut machine = make_machine("3,0,3,1,99", input, output).unwrap();
    assert_eq!(machine.run(), Err(MachineError::Port(PortError::Closed)));
    assert!(machine.is_poisoned());
    assert_eq!(machine.run(), Err(MachineError::Poisoned));
    // the first IN went through before the stream ran dry
    assert_eq!(machine[0], 1);

    let (tx, rx) = channel();
    drop(rx);
    let (_unused_tx, unused_rx) = channel();
    let mut machine = Machine::with_ports(
        [104, 1, 99],
        ChannelInput::non_blocking(unused_rx),
        ChannelOutput::new(tx),
    );
    assert_eq!(machine.run(), Err(MachineError::Port(PortError::Closed)));
}
