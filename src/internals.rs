// SPDX-FileCopyrightText: 2024 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! The operation table, and the execution context each operation mutates.

use super::*;
use crate::trace::{Trace, TracedInstr};

/// Everything an operation is allowed to mutate, besides the I/O ports.
#[derive(Clone, Default)]
pub(crate) struct ExecContext {
    pub(crate) memory: Memory,
    pub(crate) index: i64,
    pub(crate) rel_offset: i64,
    pub(crate) trace: Option<Trace>,
}

/// The literal operand, and what it resolved to, for each parameter of an executed instruction
type Resolved<const N: usize> = [(i64, i64); N];

impl ExecContext {
    pub(crate) fn new(memory: Memory) -> Self {
        Self {
            memory,
            ..Self::default()
        }
    }

    /// The literal int stored `offset` ints after the instruction word
    fn operand(&self, offset: i64) -> i64 {
        self.memory[self.addr(self.index.wrapping_add(offset))]
    }

    fn addr(&self, i: i64) -> usize {
        debug_assert!(i >= 0, "uncaught negative address {i}");
        usize::try_from(i).unwrap_or(usize::MAX)
    }

    /// Processes the `n`th parameter (counting from 1) into a concrete value using the method
    /// appropriate for `mode`.
    fn resolve_param(&self, mode: ParamMode, n: i64) -> Result<i64, MachineError> {
        let operand = self.operand(n);
        match mode {
            ParamMode::Positional => Ok(self.memory.read(operand)?),
            ParamMode::Immediate => Ok(operand),
            ParamMode::Relative => Ok(self.memory.read(operand.wrapping_add(self.rel_offset))?),
        }
    }

    /// Turns the `n`th parameter (counting from 1) into the address it says to write to.
    fn resolve_dest(&self, mode: ParamMode, n: i64) -> Result<i64, MachineError> {
        match (mode, self.operand(n)) {
            (ParamMode::Immediate, operand) => Err(MachineError::WriteToImmediate(operand)),
            (ParamMode::Positional, operand) if operand < 0 => {
                Err(MachineError::NegativeMemAccess(NegativeMemAccess(operand)))
            }
            (ParamMode::Positional, operand) => Ok(operand),
            (ParamMode::Relative, operand) => match operand.wrapping_add(self.rel_offset) {
                address if address < 0 => Err(NegativeMemAccess(address).into()),
                address => Ok(address),
            },
        }
    }

    fn record<const N: usize>(&mut self, word: i64, instr: Instruction, resolved: Resolved<N>) {
        let tracing = self.trace.is_some();
        if !tracing && !log::log_enabled!(log::Level::Trace) {
            return;
        }
        let traced = TracedInstr::new(word, instr, self.index, self.rel_offset, &resolved);
        log::trace!("{traced}");
        if let Some(trace) = self.trace.as_mut() {
            trace.push(traced);
        }
    }

    /// common logic of all 4 instructions that take 3 parameters
    fn op3(
        &mut self,
        word: i64,
        instr: Instruction,
        operation: impl Fn(i64, i64) -> i64,
    ) -> Result<StepOutcome, MachineError> {
        let a = self.resolve_param(instr.mode(0), 1)?;
        let b = self.resolve_param(instr.mode(1), 2)?;
        let dest = self.resolve_dest(instr.mode(2), 3)?;
        let val = operation(a, b);
        // operands are read before the write, which may overwrite them
        let resolved = [(self.operand(1), a), (self.operand(2), b), (self.operand(3), val)];
        self.memory.write(dest, val)?;
        self.record(word, instr, resolved);
        self.index += 4;
        Ok(StepOutcome::Running)
    }

    fn jump(
        &mut self,
        word: i64,
        instr: Instruction,
        func: impl Fn(i64) -> bool,
    ) -> Result<StepOutcome, MachineError> {
        let expr = self.resolve_param(instr.mode(0), 1)?;
        let dest = self.resolve_param(instr.mode(1), 2)?;
        if func(expr) && dest < 0 {
            return Err(MachineError::JumpToNegative(dest));
        }
        self.record(word, instr, [(self.operand(1), expr), (self.operand(2), dest)]);
        if func(expr) {
            self.index = dest;
        } else {
            self.index += 3;
        }
        Ok(StepOutcome::Running)
    }
}

/// Fetch, decode, and execute the instruction at the instruction pointer.
///
/// On any error, the context is left exactly as it was before the call, and no input is
/// consumed.
pub(crate) fn execute<I: InputPort, O: OutputPort>(
    ctx: &mut ExecContext,
    input: &mut I,
    output: &mut O,
) -> Result<StepOutcome, MachineError> {
    let word = ctx.memory[ctx.addr(ctx.index)];
    let instr = decode(word)?;

    match instr.opcode() {
        OpCode::Add => ctx.op3(word, instr, i64::wrapping_add),
        OpCode::Mul => ctx.op3(word, instr, i64::wrapping_mul),
        OpCode::In => {
            let dest = ctx.resolve_dest(instr.mode(0), 1)?;
            // make room first, so a failed write can't lose the value
            ctx.memory.ensure_addressable(ctx.addr(dest))?;
            let Some(value) = input.next_input()? else {
                return Ok(StepOutcome::Stopped(Outcome::Suspended));
            };
            ctx.record(word, instr, [(ctx.operand(1), value)]);
            ctx.memory.write(dest, value)?;
            ctx.index += 2;
            Ok(StepOutcome::Running)
        }
        OpCode::Out => {
            let value = ctx.resolve_param(instr.mode(0), 1)?;
            output.emit(value)?;
            ctx.record(word, instr, [(ctx.operand(1), value)]);
            ctx.index += 2;
            Ok(StepOutcome::Running)
        }
        OpCode::Jnz => ctx.jump(word, instr, |i| i != 0),
        OpCode::Jz => ctx.jump(word, instr, |i| i == 0),
        OpCode::Lt => ctx.op3(word, instr, |a, b| i64::from(a < b)),
        OpCode::Eq => ctx.op3(word, instr, |a, b| i64::from(a == b)),
        OpCode::Rbo => {
            let offset = ctx.resolve_param(instr.mode(0), 1)?;
            ctx.record(word, instr, [(ctx.operand(1), offset)]);
            ctx.rel_offset = ctx.rel_offset.wrapping_add(offset);
            ctx.index += 2;
            Ok(StepOutcome::Running)
        }
        OpCode::Halt => {
            ctx.record(word, instr, []);
            Ok(StepOutcome::Stopped(Outcome::Halted(ctx.memory[0])))
        }
    }
}
