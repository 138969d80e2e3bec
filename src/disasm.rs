// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Best-effort disassembly of Intcode memory
//!
//! See [disassemble] for documentation

use itertools::Itertools;
use std::fmt::{self, Display};

use crate::decode::{Instruction, decode};

/// One line of disassembly
#[derive(Debug, Clone, PartialEq)]
pub struct DisasmLine {
    /// Address of the first int on the line
    pub address: usize,
    /// What the ints were interpreted as
    pub kind: LineKind,
}

/// What a [`DisasmLine`] was interpreted as
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    /// An instruction and its literal operands
    Instr(Instruction, Vec<i64>),
    /// A run of ints that aren't a canonically-encoded instruction
    Data(Vec<i64>),
}

impl DisasmLine {
    /// Number of ints the line covers
    pub fn width(&self) -> usize {
        match &self.kind {
            LineKind::Instr(_, operands) => operands.len() + 1,
            LineKind::Data(data) => data.len(),
        }
    }

    /// Whether `address` falls within the line
    pub fn contains(&self, address: usize) -> bool {
        (self.address..self.address + self.width()).contains(&address)
    }
}

impl Display for DisasmLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LineKind::Instr(instr, operands) if operands.is_empty() => {
                write!(f, "{}", instr.opcode())
            }
            LineKind::Instr(instr, operands) => write!(
                f,
                "{} {}",
                instr.opcode(),
                instr
                    .modes()
                    .iter()
                    .zip(operands)
                    .format_with(", ", |(mode, operand), f| f(&format_args!(
                        "{mode}{operand}"
                    )))
            ),
            LineKind::Data(data) => write!(f, "DATA {}", data.iter().join(", ")),
        }
    }
}

/// Create disassembly from memory
///
/// # Example
///
/// ```
/// use intcode::disasm::disassemble;
/// let lines = disassemble(&[109, 5, 21101, 1, 2, -1, 99, 42, 0]);
/// let text: Vec<String> = lines.iter().map(ToString::to_string).collect();
/// assert_eq!(text, ["RBO #5", "ADD #1, #2, @-1", "HALT", "DATA 42, 0"]);
/// ```
///
/// # Caveats
///
/// Because any address can be jumped to, and data can hold valid instruction words, there's no
/// way to know for sure where instructions begin. Starting at address 0, the first int that is a
/// canonically-encoded instruction (no digits beyond the ones its parameters use) is taken as an
/// instruction, and anything else is grouped into `DATA` lines.
///
/// Programs can also modify themselves, so the disassembly only reflects memory as it is now.
pub fn disassemble(mem: &[i64]) -> Vec<DisasmLine> {
    let strict = |i: i64| decode(i).ok().filter(|instr| instr.encode() == i);

    let mut lines: Vec<DisasmLine> = Vec::new();
    let mut address = 0;
    while address < mem.len() {
        if let Some(instr) = strict(mem[address]) {
            let end = (address + 1 + instr.opcode().arity()).min(mem.len());
            let mut operands = mem[address + 1..end].to_vec();
            // a truncated instruction at the very end reads zeroes, just like the machine
            operands.resize(instr.opcode().arity(), 0);
            lines.push(DisasmLine {
                address,
                kind: LineKind::Instr(instr, operands),
            });
            address = end;
        } else {
            match lines.last_mut() {
                Some(DisasmLine {
                    kind: LineKind::Data(data),
                    ..
                }) => data.push(mem[address]),
                _ => lines.push(DisasmLine {
                    address,
                    kind: LineKind::Data(vec![mem[address]]),
                }),
            }
            address += 1;
        }
    }
    lines
}
