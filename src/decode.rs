// SPDX-FileCopyrightText: 2024 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Instruction decoding
//!
//! Given a 5 digit number, digits ABCDE are used as follows:
//! - DE is the two-digit opcode
//! - C is the 1st parameter's mode
//! - B is the 2nd parameter's mode
//! - A is the 3rd parameter's mode
//!
//! So *0*1202 would be parsed as follows:
//!
//! - Opcode 02 is multiply
//! - C=2: 1st parameter is in relative mode
//! - B=1: 2nd parameter is in immediate mode
//! - A=0: 3rd parameter is in positional mode
//!
//! Missing leading digits are positional mode. Digits past the last parameter the opcode takes
//! are ignored.

use std::fmt::{self, Display};

use crate::MachineError;

/// Parameter mode for Intcode instruction
///
/// Intcode instruction parameters each have a mode:  [positional], [immediate], or [relative].
///
/// When executing an intcode instruction, the instruction's parameters are interpreted in
/// accordance with their associated modes.
///
/// [positional]: ParamMode::Positional
/// [immediate]: ParamMode::Immediate
/// [relative]: ParamMode::Relative
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, Default)]
pub enum ParamMode {
    /// Positional Mode
    ///
    /// A parameter in positional mode evaluates to the value at the address specified by the
    /// parameter.
    #[default]
    Positional = 0,
    /// Immediate Mode
    ///
    /// A parameter in immediate mode evaluates directly to the value specified. Instructions which
    /// write to memory may not use immediate mode for their destinations.
    #[doc(alias = "#")]
    Immediate = 1,
    /// Relative Mode
    ///
    /// A parameter in relative mode evaluates to the value at the address specified by the
    /// parameter, added to the relative base, which starts out as `0` but can be modified
    /// throughout the program's execution.
    #[doc(alias = "@")]
    Relative = 2,
}

impl Display for ParamMode {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamMode::Positional => Ok(()),
            ParamMode::Immediate => write!(fmt, "#"),
            ParamMode::Relative => write!(fmt, "@"),
        }
    }
}

impl TryFrom<i64> for ParamMode {
    type Error = MachineError;
    fn try_from(i: i64) -> Result<Self, Self::Error> {
        match i {
            0 => Ok(ParamMode::Positional),
            1 => Ok(ParamMode::Immediate),
            2 => Ok(ParamMode::Relative),
            _ => Err(MachineError::UnknownMode(i)),
        }
    }
}

/// An Intcode `OpCode`
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[allow(missing_docs, reason = "trivial")]
pub enum OpCode {
    Add = 1,
    Mul = 2,
    In = 3,
    Out = 4,
    Jnz = 5,
    Jz = 6,
    Lt = 7,
    Eq = 8,
    Rbo = 9,
    Halt = 99,
}

impl OpCode {
    /// Number of parameters the operation takes
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Add | Self::Mul | Self::Lt | Self::Eq => 3,
            Self::Jnz | Self::Jz => 2,
            Self::In | Self::Out | Self::Rbo => 1,
            Self::Halt => 0,
        }
    }

    /// Whether the last parameter is a destination that gets written to
    #[must_use]
    pub const fn writes(self) -> bool {
        matches!(self, Self::Add | Self::Mul | Self::In | Self::Lt | Self::Eq)
    }

    /// The number of ints the instruction occupies, including the instruction word itself
    #[must_use]
    pub const fn width(self) -> i64 {
        self.arity() as i64 + 1
    }
}

impl TryFrom<i64> for OpCode {
    type Error = i64;
    fn try_from(i: i64) -> Result<Self, Self::Error> {
        match i {
            1 => Ok(Self::Add),
            2 => Ok(Self::Mul),
            3 => Ok(Self::In),
            4 => Ok(Self::Out),
            5 => Ok(Self::Jnz),
            6 => Ok(Self::Jz),
            7 => Ok(Self::Lt),
            8 => Ok(Self::Eq),
            9 => Ok(Self::Rbo),
            99 => Ok(Self::Halt),
            _ => Err(i),
        }
    }
}

impl Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "ADD"),
            Self::Mul => write!(f, "MUL"),
            Self::In => write!(f, "IN"),
            Self::Out => write!(f, "OUT"),
            Self::Jnz => write!(f, "JNZ"),
            Self::Jz => write!(f, "JZ"),
            Self::Lt => write!(f, "LT"),
            Self::Eq => write!(f, "EQ"),
            Self::Rbo => write!(f, "RBO"),
            Self::Halt => write!(f, "HALT"),
        }
    }
}

/// A decoded instruction word
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Instruction {
    opcode: OpCode,
    modes: [ParamMode; 3],
}

impl Instruction {
    /// The operation to run
    #[must_use]
    pub const fn opcode(&self) -> OpCode {
        self.opcode
    }

    /// One mode per parameter the operation takes, first parameter first
    #[must_use]
    pub fn modes(&self) -> &[ParamMode] {
        &self.modes[..self.opcode.arity()]
    }

    /// Mode of the `n`th parameter, counting from 0.
    ///
    /// Positional for any `n` the operation doesn't use.
    #[must_use]
    pub fn mode(&self, n: usize) -> ParamMode {
        self.modes().get(n).copied().unwrap_or_default()
    }

    /// The canonical instruction word for this instruction, with no ignored digits
    #[must_use]
    pub fn encode(&self) -> i64 {
        self.modes()
            .iter()
            .rev()
            .fold(0, |acc, &mode| acc * 10 + mode as i64)
            * 100
            + self.opcode as i64
    }
}

/// Split an instruction word into its operation and parameter modes.
///
/// # Example
///
/// ```
/// use intcode::{decode, OpCode, ParamMode};
/// let instr = decode(1002).unwrap();
/// assert_eq!(instr.opcode(), OpCode::Mul);
/// assert_eq!(
///     instr.modes(),
///     &[ParamMode::Positional, ParamMode::Immediate, ParamMode::Positional]
/// );
/// assert!(decode(99).unwrap().modes().is_empty());
/// ```
///
/// # Errors
///
/// | Condition                                      | Error type             |
/// |------------------------------------------------|------------------------|
/// | last two digits aren't a known opcode          | [`UnrecognizedOpcode`] |
/// | a parameter's mode digit isn't 0, 1, or 2      | [`UnknownMode`]        |
///
/// [`UnrecognizedOpcode`]: MachineError::UnrecognizedOpcode
/// [`UnknownMode`]: MachineError::UnknownMode
pub fn decode(word: i64) -> Result<Instruction, MachineError> {
    let opcode =
        OpCode::try_from(word % 100).map_err(|_| MachineError::UnrecognizedOpcode(word))?;
    let mut modes = [ParamMode::Positional; 3];
    let mut digits = word / 100;
    for mode in modes.iter_mut().take(opcode.arity()) {
        *mode = ParamMode::try_from(digits % 10)?;
        digits /= 10;
    }
    Ok(Instruction { opcode, modes })
}
