// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Opt-in record of every instruction a [Machine] executes
//!
//! [Machine]: crate::Machine

use std::fmt::{self, Display};

use crate::decode::{Instruction, OpCode, ParamMode};

/// An opaque type containing information about what instruction was executed, which can be queried
/// with its various methods, or converted into a [String] using its [Display] impl.
#[derive(Debug, Clone, PartialEq)]
pub struct TracedInstr {
    op_int: i64,
    instr: Instruction,
    instr_ptr: i64,
    rel_base: i64,
    // (literal operand, resolved value) per parameter
    params: [(i64, i64); 3],
}

impl TracedInstr {
    pub(crate) fn new(
        op_int: i64,
        instr: Instruction,
        instr_ptr: i64,
        rel_base: i64,
        resolved_params: &[(i64, i64)],
    ) -> Self {
        debug_assert_eq!(resolved_params.len(), instr.opcode().arity());
        let mut params = [(0, 0); 3];
        params[..resolved_params.len()].copy_from_slice(resolved_params);
        Self {
            op_int,
            instr,
            instr_ptr,
            rel_base,
            params,
        }
    }

    /// Return the relative base at the time the traced instruction was executed
    pub fn rel_base(&self) -> i64 {
        self.rel_base
    }

    /// Return the instruction pointer's position when the traced instruction was executed
    pub fn instr_ptr(&self) -> i64 {
        self.instr_ptr
    }

    /// Return the actual integer of the traced instruction
    pub fn op_int(&self) -> i64 {
        self.op_int
    }

    /// Return the opcode of the traced instruction
    pub fn op_code(&self) -> OpCode {
        self.instr.opcode()
    }

    /// Return the parameter modes of the traced instruction
    pub fn param_modes(&self) -> &[ParamMode] {
        self.instr.modes()
    }

    /// Each parameter's literal operand, paired with the value it resolved to
    pub fn params(&self) -> &[(i64, i64)] {
        &self.params[..self.instr.opcode().arity()]
    }

    /// If the instruction stored a value, return that value
    pub fn stored_val(&self) -> Option<i64> {
        let opcode = self.instr.opcode();
        opcode
            .writes()
            .then(|| self.params[opcode.arity() - 1].1)
    }
}

impl Display for TracedInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ran instruction at {:0>4}: op int {: <5} | ",
            self.instr_ptr, self.op_int
        )?;
        let modes = self.instr.modes();
        let opcode = self.instr.opcode();

        match (opcode, self.params()) {
            (
                OpCode::Add | OpCode::Mul | OpCode::Lt | OpCode::Eq,
                &[(pa, va), (pb, vb), (dest, stored)],
            ) => {
                write!(
                    f,
                    "[{opcode} {}{pa} (resolves to {va}), {}{pb} (resolves to {vb}), {}{dest} (stored {stored})]",
                    modes[0], modes[1], modes[2],
                )
            }
            (OpCode::Jnz | OpCode::Jz, &[(p_cond, v_cond), (p_dest, v_dest)]) => {
                let jumped = (opcode == OpCode::Jnz) == (v_cond != 0);
                write!(
                    f,
                    "[{opcode} {}{p_cond} (resolves to {v_cond}), {}{p_dest} ({} to {v_dest})]",
                    modes[0],
                    modes[1],
                    if jumped { "jumped" } else { "didn't jump" }
                )
            }
            (OpCode::In, &[(p, v)]) => write!(f, "[IN {}{p} (stored {v})]", modes[0]),
            (OpCode::Out, &[(p, v)]) => write!(f, "[OUT {}{p} (resolves to {v})]", modes[0]),
            (OpCode::Rbo, &[(p, v)]) => write!(
                f,
                "[RBO {}{p} (resolved to {v}) (went from {} to {})]",
                modes[0],
                self.rel_base,
                self.rel_base.wrapping_add(v),
            ),
            _ => write!(f, "[HALT]"),
        }
    }
}

/// A log of instructions that a [Machine] has executed since a call to [`Machine::start_trace`]
///
/// [Machine]: crate::Machine
/// [`Machine::start_trace`]: crate::Machine::start_trace
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Trace(pub Vec<TracedInstr>);

impl Trace {
    pub(crate) fn push(&mut self, instr: TracedInstr) {
        self.0.push(instr);
    }

    /// Number of traced instructions
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing has been traced yet
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
