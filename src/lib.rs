// SPDX-FileCopyrightText: 2024 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD
#![warn(missing_docs)]

//! A suspendable Intcode virtual machine
//!
//! [`Machine`] is a fully-functional Intcode computer, with all of the [Opcodes] and
//! [Parameter Modes] defined in the completed Intcode computer for [Day 9]. It uses [`i64`] as
//! the type of Intcode integers, grows its memory on demand, and can be stopped whenever it needs
//! input that isn't there yet, then resumed exactly where it left off once the host provides it.
//!
//! # Example
//!
//! ```rust
//! use intcode::prelude::*;
//! let mut machine: Machine = "3,3,1101,-1,5,0,99".parse().unwrap();
//!
//! // no input queued, so it stops at the IN instruction
//! assert_eq!(machine.run().unwrap(), Outcome::Suspended);
//! assert_eq!(machine.state(), State::Suspended);
//!
//! machine.queue_input([5]);
//! assert_eq!(machine.run().unwrap(), Outcome::Halted(10));
//! ```
//!
//! Machines are generic over their [ports], so the same program can instead be run against
//! stdin and stdout, or wired to other machines with channels:
//!
//! ```rust
//! use intcode::prelude::*;
//! use intcode::ports::{LineInput, LineOutput};
//! let input = LineInput::new("7\n".as_bytes());
//! let mut machine = make_machine("3,0,4,0,99", input, LineOutput::new(Vec::<u8>::new())).unwrap();
//! assert_eq!(machine.run().unwrap(), Outcome::Halted(7));
//! let (_, output) = machine.into_ports();
//! assert_eq!(output.into_inner(), b"7\n");
//! ```
//!
//! [Opcodes]: https://esolangs.org/wiki/Intcode#Opcodes
//! [Parameter Modes]: https://esolangs.org/wiki/Intcode#Parameter_Modes
//! [Day 9]: https://adventofcode.com/2019/day/9

/// A module implementing the operations themselves, and the context they run in
mod internals;

/// The Program Store
mod mmu;

mod decode;
mod program;

pub mod disasm;
pub mod ports;
pub mod trace;

use std::fmt::{self, Debug, Display};
use std::io::{self, Write};
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use thiserror::Error;

pub use decode::{Instruction, OpCode, ParamMode, decode};
pub use mmu::Memory;
pub use program::{ProgramError, parse_program};

use internals::ExecContext;
use ports::{BufferOutput, InputPort, OutputPort, PortError, QueueInput};
use trace::Trace;

/// A small module that re-exports items useful when working with the Intcode machine
pub mod prelude {
    pub use crate::{Machine, MachineError, Outcome, State, StepOutcome, make_machine};
}

/// Where a [`Machine`] is in its lifecycle
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum State {
    /// Constructed, but nothing has been executed
    Ready,
    /// Executing, or stopped between calls to [`Machine::step`]
    Running,
    /// Stopped on an `IN` instruction with no input available. The instruction pointer still
    /// points at that instruction, so it's retried when execution resumes.
    Suspended,
    /// A `HALT` instruction has been executed. No more instructions will be executed.
    Halted,
}

/// Why a [`Machine`] stopped running
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Outcome {
    /// Halted, with the value at address 0 at the time
    Halted(i64),
    /// Needs input before it can go on
    Suspended,
}

impl Outcome {
    /// Whether the machine halted
    #[must_use]
    pub const fn is_halted(self) -> bool {
        matches!(self, Self::Halted(_))
    }
}

/// The outcome when a [`Machine`] tries to execute a single instruction
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StepOutcome {
    /// step ran successfully
    Running,
    /// Step could not run, with the [`Outcome`] representing why
    Stopped(Outcome),
}

/// Attempted to access the contained negative memory address
#[derive(Debug, PartialEq, Eq, Clone, Copy, Error)]
#[error("could not convert {0} to unsigned address")]
pub struct NegativeMemAccess(pub i64);

/// Memory could not be grown to hold the contained address
#[derive(Debug, PartialEq, Eq, Clone, Copy, Error)]
#[error("could not grow memory to hold address {0}")]
pub struct OutOfMemory(pub u64);

/// A fatal error that occurred when executing an intcode instruction
#[derive(Debug, Error)]
pub enum MachineError {
    /// An invalid opcode was encountered, in the contained instruction word
    #[error("encountered unrecognized opcode in instruction {0}")]
    UnrecognizedOpcode(i64),
    /// An unknown parameter mode was encountered
    #[error("encountered unknown parameter mode {0}")]
    UnknownMode(i64),
    /// A parameter referenced a negative memory address
    #[error(transparent)]
    NegativeMemAccess(#[from] NegativeMemAccess),
    /// A write was past the furthest address memory could grow to
    #[error(transparent)]
    OutOfMemory(#[from] OutOfMemory),
    /// A jump resolved to a negative address
    #[error("jumped to negative address {0}")]
    JumpToNegative(i64),
    /// An instruction tried to write to an immediate destination
    #[error("code attempted to write to immediate {0}")]
    WriteToImmediate(i64),
    /// An I/O port failed
    #[error("I/O port failed: {0}")]
    Port(#[from] PortError),
    /// A machine was used after previously erroring out
    #[error("tried to reuse a machine after a fatal error")]
    Poisoned,
}

// I/O errors are compared by kind only
impl PartialEq for MachineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::UnrecognizedOpcode(lhs), Self::UnrecognizedOpcode(rhs))
            | (Self::UnknownMode(lhs), Self::UnknownMode(rhs))
            | (Self::JumpToNegative(lhs), Self::JumpToNegative(rhs))
            | (Self::WriteToImmediate(lhs), Self::WriteToImmediate(rhs)) => lhs == rhs,
            (Self::NegativeMemAccess(lhs), Self::NegativeMemAccess(rhs)) => lhs == rhs,
            (Self::OutOfMemory(lhs), Self::OutOfMemory(rhs)) => lhs == rhs,
            (Self::Port(PortError::Closed), Self::Port(PortError::Closed))
            | (Self::Poisoned, Self::Poisoned) => true,
            (Self::Port(PortError::Io(lhs)), Self::Port(PortError::Io(rhs))) => {
                lhs.kind() == rhs.kind()
            }
            _ => false,
        }
    }
}

/// Buffered output contained values that aren't ASCII characters
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct NonAsciiOutput {
    /// Everything that was drained from the buffer
    pub values: Vec<i64>,
    /// Index within `values` of the first non-ASCII value
    pub position: usize,
}

impl Display for NonAsciiOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "output value {} (#{}) is not a valid ASCII character",
            self.values[self.position], self.position
        )
    }
}

impl std::error::Error for NonAsciiOutput {}

/// An Intcode machine
///
/// It owns its memory, registers, and both of its I/O [ports] exclusively, so independent
/// machines can run on separate threads with no locking. With the default ports, cloning
/// produces a fully independent copy, useful for exploring several possible inputs from the
/// same point.
#[derive(Clone)]
pub struct Machine<I = QueueInput, O = BufferOutput> {
    ctx: ExecContext,
    input: I,
    output: O,
    state: State,
    poisoned: bool,
}

// ports and traces are not compared
impl<I, O> PartialEq for Machine<I, O> {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
            && self.ctx.index == other.ctx.index
            && self.ctx.rel_offset == other.ctx.rel_offset
            && self.ctx.memory == other.ctx.memory
    }
}

impl<I: Debug, O: Debug> Debug for Machine<I, O> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Machine")
            .field("code", &self.ctx.memory)
            .field("rbo", &self.ctx.rel_offset)
            .field("ip", &self.ctx.index)
            .field("state", &self.state)
            .field("poisoned", &self.poisoned)
            .field("tracing", &self.ctx.trace.is_some())
            .field("input", &self.input)
            .field("output", &self.output)
            .finish()
    }
}

/// Addresses past the end of memory read as `0`
impl<I, O> Index<u64> for Machine<I, O> {
    type Output = i64;

    fn index(&self, i: u64) -> &Self::Output {
        self.ctx.memory.index(usize::try_from(i).unwrap_or(usize::MAX))
    }
}

/// Grows memory to hold the address, as a write from the program would.
///
/// # Panics
///
/// Panics if memory can't grow that far. Use [`Machine::poke`] to get an error instead.
impl<I, O> IndexMut<u64> for Machine<I, O> {
    fn index_mut(&mut self, i: u64) -> &mut Self::Output {
        self.ctx.memory.index_mut(usize::try_from(i).unwrap_or(usize::MAX))
    }
}

/// Build a [`Machine`] from program text and the ports it should use.
///
/// # Errors
///
/// Returns a [`ProgramError`] if `program_text` isn't comma-separated integers.
pub fn make_machine<I: InputPort, O: OutputPort>(
    program_text: &str,
    input: I,
    output: O,
) -> Result<Machine<I, O>, ProgramError> {
    Ok(Machine::with_ports(parse_program(program_text)?, input, output))
}

impl Machine {
    /// Create a new machine with a programmatic input queue and a buffered output. Collects
    /// `code` into the starting memory state.
    pub fn new(code: impl IntoIterator<Item = i64>) -> Self {
        Self::with_ports(code, QueueInput::default(), BufferOutput::default())
    }

    /// Queue up `inputs`, run until halted or suspended, and take everything that was output.
    ///
    /// ```
    /// use intcode::prelude::*;
    /// let mut machine = Machine::new([3, 10, 4, 10, 99]);
    /// assert_eq!(machine.run_through_inputs([]).unwrap(), (vec![], Outcome::Suspended));
    /// assert_eq!(machine.run_through_inputs([1]).unwrap(), (vec![1], Outcome::Halted(3)));
    /// ```
    ///
    /// # Errors
    ///
    /// If [`run`](Machine::run) fails, returns the resulting [`MachineError`] unchanged. Any
    /// output produced before the error stays buffered.
    pub fn run_through_inputs(
        &mut self,
        inputs: impl IntoIterator<Item = i64>,
    ) -> Result<(Vec<i64>, Outcome), MachineError> {
        self.queue_input(inputs);
        let outcome = self.run()?;
        Ok((self.flush_output(), outcome))
    }
}

impl FromStr for Machine {
    type Err = ProgramError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_program(s).map(Self::new)
    }
}

impl<O> Machine<QueueInput, O> {
    /// Append values to the input queue
    pub fn queue_input(&mut self, values: impl IntoIterator<Item = i64>) {
        self.input.extend(values);
    }

    /// Append each character of `text` to the input queue, as its code point
    pub fn queue_ascii_input(&mut self, text: &str) {
        self.input.extend_ascii(text);
    }
}

impl<I> Machine<I, BufferOutput> {
    /// Take everything output so far, leaving the buffer empty
    pub fn flush_output(&mut self) -> Vec<i64> {
        self.output.take()
    }

    /// Take everything output so far as text, leaving the buffer empty
    ///
    /// ```
    /// use intcode::prelude::*;
    /// let mut machine = Machine::new([104, 72, 104, 105, 104, 10, 99]);
    /// machine.run().unwrap();
    /// assert_eq!(machine.flush_ascii_output().unwrap(), "Hi\n");
    /// ```
    ///
    /// # Errors
    ///
    /// If any value is outside of the ASCII range, returns a [`NonAsciiOutput`] holding every
    /// value that was taken.
    pub fn flush_ascii_output(&mut self) -> Result<String, NonAsciiOutput> {
        let values = self.output.take();
        match values.iter().position(|&v| ports::to_ascii(v).is_none()) {
            None => Ok(values.iter().filter_map(|&v| ports::to_ascii(v)).collect()),
            Some(position) => Err(NonAsciiOutput { values, position }),
        }
    }
}

impl<I: InputPort, O: OutputPort> Machine<I, O> {
    /// Create a new machine using the given ports. Collects `code` into the starting memory state.
    pub fn with_ports(code: impl IntoIterator<Item = i64>, input: I, output: O) -> Self {
        Self {
            ctx: ExecContext::new(code.into_iter().collect()),
            input,
            output,
            state: State::Ready,
            poisoned: false,
        }
    }

    /// Run a single instruction
    ///
    /// On an error, returns an [Err] containing the appropriate [`MachineError`]
    /// Otherwise, returns an [Ok] containing the [`StepOutcome`]
    ///
    /// # Example
    ///
    /// ```
    /// use intcode::prelude::*;
    /// let mut machine = Machine::new([1101, 90, 9, 8, 3, 7, 4, -1]);
    ///
    /// // the first instruction is `ADD #90, #9, 8`
    /// assert_eq!(machine.step(), Ok(StepOutcome::Running));
    /// // the second instruction is `IN 7`, but no input was provided.
    /// assert_eq!(machine.step(), Ok(StepOutcome::Stopped(Outcome::Suspended)));
    ///
    /// // now try again, but with input available
    /// machine.queue_input([8]);
    /// assert_eq!(machine.step(), Ok(StepOutcome::Running));
    ///
    /// // the third instruction was originally OUT -1, but the address was overwritten by the
    /// // previous instruction, so it will now read from address 8, where the 1st instruction
    /// // inserted 99.
    /// assert_eq!(machine.step(), Ok(StepOutcome::Running));
    /// assert_eq!(machine.flush_output(), vec![99]);
    ///
    /// // finally, the halt instruction
    /// assert_eq!(machine.step(), Ok(StepOutcome::Stopped(Outcome::Halted(1101))));
    /// ```
    ///
    /// # Errors
    ///
    /// If the machine has previously marked itself as poisoned, returns
    /// [`MachineError::Poisoned`] before attempting to do anything.
    ///
    /// Otherwise, if any of the following conditions occur, it marks itself as poisoned and
    /// returns the listed [`MachineError`] variant, leaving memory and registers as they were
    /// before the instruction:
    ///
    /// | Condition                                           | Error type             |
    /// |-----------------------------------------------------|------------------------|
    /// | Opcode is unrecognized                              | [`UnrecognizedOpcode`] |
    /// | Mode digit is unrecognized                          | [`UnknownMode`]        |
    /// | Instruction accesses a negative index               | [`NegativeMemAccess`]  |
    /// | Memory can't grow to hold a written address         | [`OutOfMemory`]        |
    /// | Jump instruction would jump to negative index       | [`JumpToNegative`]     |
    /// | Add, Mul, In, Lt, or Eq output is in immediate mode | [`WriteToImmediate`]   |
    /// | Reading input or writing output failed              | [`Port`]               |
    ///
    /// [`UnrecognizedOpcode`]: MachineError::UnrecognizedOpcode
    /// [`UnknownMode`]: MachineError::UnknownMode
    /// [`NegativeMemAccess`]: MachineError::NegativeMemAccess
    /// [`OutOfMemory`]: MachineError::OutOfMemory
    /// [`JumpToNegative`]: MachineError::JumpToNegative
    /// [`WriteToImmediate`]: MachineError::WriteToImmediate
    /// [`Port`]: MachineError::Port
    #[doc(alias("exec_instruction"))]
    pub fn step(&mut self) -> Result<StepOutcome, MachineError> {
        if self.poisoned {
            return Err(MachineError::Poisoned);
        }

        if self.state == State::Halted {
            return Ok(StepOutcome::Stopped(Outcome::Halted(self.ctx.memory[0])));
        }

        match internals::execute(&mut self.ctx, &mut self.input, &mut self.output) {
            Ok(StepOutcome::Running) => {
                self.state = State::Running;
                Ok(StepOutcome::Running)
            }
            Ok(StepOutcome::Stopped(outcome)) => {
                self.state = match outcome {
                    Outcome::Halted(_) => State::Halted,
                    Outcome::Suspended => State::Suspended,
                };
                Ok(StepOutcome::Stopped(outcome))
            }
            Err(e) => {
                log::debug!("machine poisoned at ip {}: {e}", self.ctx.index);
                self.poisoned = true;
                Err(e)
            }
        }
    }

    /// Execute until either the program halts, or it tries to read input that isn't available.
    ///
    /// A halted machine returns [`Outcome::Halted`] straight away without executing anything.
    /// A suspended machine picks up by retrying the `IN` instruction it stopped on.
    ///
    /// # Errors
    ///
    /// If an internal call to [`self.step`][Machine::step] fails, returns the resulting
    /// [`MachineError`] unchanged.
    pub fn run(&mut self) -> Result<Outcome, MachineError> {
        if self.poisoned {
            return Err(MachineError::Poisoned);
        }
        if self.state == State::Halted {
            return Ok(Outcome::Halted(self.ctx.memory[0]));
        }
        log::debug!(
            "running from ip {} (rbo {}, {:?})",
            self.ctx.index,
            self.ctx.rel_offset,
            self.state
        );
        loop {
            if let StepOutcome::Stopped(outcome) = self.step()? {
                match outcome {
                    Outcome::Halted(result) => log::debug!("halted with {result} at address 0"),
                    Outcome::Suspended => {
                        log::debug!("suspended awaiting input at ip {}", self.ctx.index);
                    }
                }
                break Ok(outcome);
            }
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> State {
        self.state
    }

    /// Whether a fatal error has occurred, leaving the machine unusable
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Current instruction pointer
    pub fn instr_ptr(&self) -> i64 {
        self.ctx.index
    }

    /// Current relative base
    pub fn rel_base(&self) -> i64 {
        self.ctx.rel_offset
    }

    /// The whole Program Store
    pub fn memory(&self) -> &Memory {
        &self.ctx.memory
    }

    /// Manually set a memory location to a provided value
    ///
    /// # Errors
    ///
    /// If `address` is negative, returns [`MachineError::NegativeMemAccess`]. If memory can't grow
    /// to hold it, returns [`MachineError::OutOfMemory`]. The machine is not poisoned either way.
    #[doc(alias("mem_override", "write"))]
    pub fn poke(&mut self, address: i64, value: i64) -> Result<(), MachineError> {
        self.ctx.memory.write(address, value)
    }

    /// Get the memory at `address`.
    ///
    /// # Errors
    ///
    /// if `address` is negative, returns a [`NegativeMemAccess`] error
    #[doc(alias("mem_get", "read"))]
    pub fn peek(&self, address: i64) -> Result<i64, NegativeMemAccess> {
        self.ctx.memory.read(address)
    }

    /// The input port
    pub fn input(&self) -> &I {
        &self.input
    }

    /// The input port, mutably
    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    /// The output port
    pub fn output(&self) -> &O {
        &self.output
    }

    /// The output port, mutably
    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Consume the machine, returning its ports
    pub fn into_ports(self) -> (I, O) {
        (self.input, self.output)
    }

    /// Begin a [Trace] of executed instructions. If a trace is already running, this replaces that
    /// trace and returns it in a [`Some`], otherwise, it returns [`None`].
    ///
    /// # Example
    /// ```
    /// use intcode::prelude::*;
    /// let mut machine = Machine::new([1101, 90, 9, 4, 3]);
    /// assert!(machine.start_trace().is_none());
    /// machine.run().unwrap();
    /// let trace = machine.end_trace().unwrap();
    /// assert_eq!(trace.len(), 2);
    /// assert_eq!(trace.0[0].stored_val(), Some(99));
    /// ```
    pub fn start_trace(&mut self) -> Option<Trace> {
        self.ctx.trace.replace(Trace::default())
    }

    /// Stop tracing executed instructions into a [Trace]. If no trace was active, returns [`None`]
    ///
    /// see [`Machine::start_trace`]
    pub fn end_trace(&mut self) -> Option<Trace> {
        self.ctx.trace.take()
    }

    /// Get a view of the current trace
    pub fn show_trace(&self) -> Option<&Trace> {
        self.ctx.trace.as_ref()
    }

    /// Write human-readable information about the machine's state to `writer`, followed by a
    /// disassembly of its memory with the instruction pointer marked.
    ///
    /// # Errors
    ///
    /// If writing to `writer` fails, returns the resulting [`io::Error`].
    pub fn write_state<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "MACHINE STATE")?;
        writeln!(writer, "    state: {:?}", self.state)?;
        if self.poisoned {
            writeln!(writer, "    poisoned by a fatal error")?;
        }
        writeln!(writer, "    instruction pointer: {}", self.ctx.index)?;
        writeln!(writer, "    relative base: {}", self.ctx.rel_offset)?;
        writeln!(writer, "    memory: {} ints", self.ctx.memory.len())?;
        if let Some(n) = self.input.pending() {
            writeln!(writer, "    pending input: {n}")?;
        }
        if let Some(n) = self.output.buffered() {
            writeln!(writer, "    buffered output: {n}")?;
        }
        if let Some(trace) = self.ctx.trace.as_ref() {
            writeln!(writer, "    traced instructions: {}", trace.len())?;
        }

        writeln!(writer, "\nDISASSEMBLY")?;
        let ip = usize::try_from(self.ctx.index).ok();
        for line in disasm::disassemble(self.ctx.memory.as_slice()) {
            let marker = if ip.is_some_and(|ip| line.contains(ip)) {
                '>'
            } else {
                ' '
            };
            writeln!(writer, "{marker} {:>6}: {line}", line.address)?;
        }
        Ok(())
    }

    /// [`write_state`](Machine::write_state), into a [String]
    pub fn dump_state(&self) -> String {
        let mut buf = Vec::new();
        self.write_state(&mut buf)
            .expect("writing to a Vec<u8> can't fail");
        String::from_utf8(buf).expect("only valid UTF-8 is written")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_text(text: &str) -> Machine {
        let mut machine: Machine = text.parse().unwrap();
        assert!(machine.run().unwrap().is_halted());
        machine
    }

    /// Example program from day 9, which takes no input and outputs its own code
    #[test]
    fn quine() {
        let quine_code = vec![
            109, 1, 204, -1, 1001, 100, 1, 100, 1008, 100, 16, 101, 1006, 101, 0, 99,
        ];
        let mut machine = Machine::new(quine_code.clone());
        let (outputs, Outcome::Halted(_)) = machine.run_through_inputs([]).unwrap() else {
            panic!("Did not halt");
        };
        assert_eq!(quine_code, outputs);
    }

    /// Example program from day 9, which "should output a 16-digit number"
    #[test]
    fn output_sixteen_digit() {
        let mut machine = Machine::new([1102, 34915192, 34915192, 7, 4, 7, 99, 0]);
        let (outputs, Outcome::Halted(_)) = machine.run_through_inputs([]).unwrap() else {
            panic!("Did not halt");
        };
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].to_string().len(), 16);
    }

    /// Example program from day 9, which "should output the large number in the middle"
    #[test]
    fn large_number() {
        let mut machine: Machine = "104,1125899906842624,99".parse().unwrap();
        assert_eq!(machine.run(), Ok(Outcome::Halted(104)));
        assert_eq!(machine.flush_output(), vec![1125899906842624]);
    }

    #[test]
    fn self_referential_arithmetic() {
        assert_eq!(run_text("1,0,0,0,99")[0], 2);
        assert_eq!(run_text("1101,20,22,0,99")[0], 42);
        let machine = run_text("2,3,0,3,99");
        assert_eq!(machine.memory().as_slice(), &[2, 3, 0, 6, 99]);
    }

    #[test]
    fn relative_mode() {
        assert_eq!(run_text("109,2,22201,-1,0,-2,99")[0], 22203);
        assert_eq!(run_text("109,1,109,1,2201,-2,-1,0,99")[0], 110);
        let machine = run_text("109,2,21101,21,21,-2,99");
        assert_eq!(machine[0], 42);
        assert_eq!(machine.rel_base(), 2);
    }

    #[test]
    fn memory_grows_on_write_only() {
        // reading past the end sees zeroes without growing
        let machine = run_text("2,20,1,0,99");
        assert_eq!(machine[0], 0);
        assert_eq!(machine.memory().len(), 5);

        // RBO #10; ADD #3, #4, @0; OUT @0; HALT
        let mut machine: Machine = "109,10,21101,3,4,0,204,0,99".parse().unwrap();
        assert_eq!(machine.memory().len(), 9);
        assert!(machine.run().unwrap().is_halted());
        assert_eq!(machine.memory().len(), 11);
        assert_eq!(machine.peek(10), Ok(7));
        assert_eq!(machine.peek(9), Ok(0));
        assert_eq!(machine.flush_output(), vec![7]);
    }

    #[test]
    fn suspend_and_resume() {
        let mut machine: Machine = "3,3,1101,-1,5,0,99".parse().unwrap();
        assert_eq!(machine.state(), State::Ready);
        assert_eq!(machine.run(), Ok(Outcome::Suspended));
        assert_eq!(machine.state(), State::Suspended);
        assert_eq!(machine[0], 3);
        assert_eq!(machine.instr_ptr(), 0);

        // running again without input changes nothing
        let before = machine.clone();
        assert_eq!(machine.run(), Ok(Outcome::Suspended));
        assert_eq!(machine, before);

        machine.queue_input([5]);
        assert_eq!(machine.run(), Ok(Outcome::Halted(10)));
        assert_eq!(machine.state(), State::Halted);
    }

    #[test]
    fn halted_is_terminal() {
        let mut machine = Machine::new([104, 1, 99]);
        assert_eq!(machine.run(), Ok(Outcome::Halted(104)));
        machine.poke(0, 4).unwrap();
        let before = machine.clone();
        assert_eq!(machine.run(), Ok(Outcome::Halted(4)));
        assert_eq!(machine.step(), Ok(StepOutcome::Stopped(Outcome::Halted(4))));
        assert_eq!(machine, before);
        assert_eq!(machine.flush_output(), vec![1]);
    }

    #[test]
    fn fatal_errors_poison() {
        let mut machine = Machine::new([1, 0, 0, 0, 42]);
        assert_eq!(machine.run(), Err(MachineError::UnrecognizedOpcode(42)));
        assert!(machine.is_poisoned());
        assert_eq!(machine.instr_ptr(), 4);
        assert_eq!(machine[0], 2);
        assert_eq!(machine.run(), Err(MachineError::Poisoned));

        let mut machine = Machine::new([1101, 1, 1, 0, 11101, 1, 1, 5, 99]);
        assert_eq!(machine.run(), Err(MachineError::WriteToImmediate(5)));
        assert_eq!(machine.memory().as_slice(), &[2, 1, 1, 0, 11101, 1, 1, 5, 99]);

        let mut machine = Machine::new([4, -1, 99]);
        assert_eq!(
            machine.run(),
            Err(MachineError::NegativeMemAccess(NegativeMemAccess(-1)))
        );

        let mut machine = Machine::new([1105, 1, -4]);
        assert_eq!(machine.run(), Err(MachineError::JumpToNegative(-4)));

        let mut machine = Machine::new([304, 0, 99]);
        assert_eq!(machine.run(), Err(MachineError::UnknownMode(3)));
    }

    #[test]
    fn immediate_input_destination_keeps_input() {
        let mut machine = Machine::new([103, 0, 99]);
        machine.queue_input([12]);
        assert_eq!(machine.run(), Err(MachineError::WriteToImmediate(0)));
        assert_eq!(machine.input().len(), 1);
    }

    #[test]
    fn unreachable_write_is_fatal() {
        let oom = || MachineError::OutOfMemory(OutOfMemory(i64::MAX as u64));

        let mut machine = Machine::new([1101, 1, 1, i64::MAX, 99]);
        assert_eq!(machine.run(), Err(oom()));
        assert!(machine.is_poisoned());
        assert_eq!(machine.instr_ptr(), 0);
        assert_eq!(machine.memory().len(), 5);
        assert_eq!(machine.run(), Err(MachineError::Poisoned));

        // IN doesn't take a value it has nowhere to put
        let mut machine = Machine::new([3, i64::MAX, 99]);
        machine.queue_input([12]);
        assert_eq!(machine.run(), Err(oom()));
        assert_eq!(machine.input().len(), 1);

        let mut machine = Machine::new([99]);
        assert_eq!(machine.poke(i64::MAX, 1), Err(oom()));
        assert!(!machine.is_poisoned());
        assert_eq!(machine.run(), Ok(Outcome::Halted(99)));
    }

    #[test]
    fn equality_includes_state() {
        let fresh = Machine::new([3, 0, 99]);
        let mut suspended = fresh.clone();
        assert_eq!(suspended.run(), Ok(Outcome::Suspended));
        // nothing was executed, but the lifecycle moved on
        assert_eq!(suspended.memory(), fresh.memory());
        assert_eq!(suspended.instr_ptr(), fresh.instr_ptr());
        assert_ne!(suspended, fresh);
    }

    #[test]
    fn ascii_ports() {
        // echo 3 chars, then output a large value
        let mut machine = Machine::new([3, 20, 4, 20, 3, 20, 4, 20, 3, 20, 4, 20, 99]);
        machine.queue_ascii_input("ok\n");
        assert!(machine.run().unwrap().is_halted());
        assert_eq!(machine.flush_ascii_output(), Ok(String::from("ok\n")));

        let mut machine = Machine::new([104, 65, 104, 1000, 99]);
        machine.run().unwrap();
        let err = machine.flush_ascii_output().unwrap_err();
        assert_eq!(err.values, vec![65, 1000]);
        assert_eq!(err.position, 1);
        assert!(machine.flush_output().is_empty());
    }

    #[test]
    fn clone_is_independent() {
        // read twice, outputting each value doubled
        let mut machine = Machine::new([3, 100, 102, 2, 100, 101, 4, 101, 1105, 1, 0]);
        machine.queue_input([1]);
        assert_eq!(machine.run(), Ok(Outcome::Suspended));
        let mut fork = machine.clone();

        machine.queue_input([10]);
        fork.queue_input([20]);
        assert_eq!(machine.run(), Ok(Outcome::Suspended));
        assert_eq!(fork.run(), Ok(Outcome::Suspended));

        assert_eq!(machine.flush_output(), vec![2, 20]);
        assert_eq!(fork.flush_output(), vec![2, 40]);
        assert_eq!(machine.peek(100), Ok(10));
        assert_eq!(fork.peek(100), Ok(20));
    }

    #[test]
    fn dump_marks_instruction_pointer() {
        let mut machine = Machine::new([104, 1, 3, 9, 99]);
        machine.run().unwrap();
        let dump = machine.dump_state();
        assert!(dump.contains("state: Suspended"), "{dump}");
        assert!(dump.contains("instruction pointer: 2"), "{dump}");
        assert!(dump.contains("buffered output: 1"), "{dump}");
        assert!(dump.contains(">      2: IN 9"), "{dump}");
        assert!(dump.contains("       0: OUT #1"), "{dump}");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Step `machine` until it stops, errors, or `limit` steps have run
    fn run_limited(machine: &mut Machine, limit: usize) -> Option<Result<Outcome, MachineError>> {
        for _ in 0..limit {
            match machine.step() {
                Ok(StepOutcome::Running) => {}
                Ok(StepOutcome::Stopped(outcome)) => return Some(Ok(outcome)),
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }

    proptest! {
        #[test]
        fn random_programs_are_deterministic(
            code in prop::collection::vec(-100i64..2300, 1..64),
            inputs in prop::collection::vec(any::<i64>(), 0..4),
        ) {
            let mut first = Machine::new(code);
            first.queue_input(inputs);
            let mut second = first.clone();
            let a = run_limited(&mut first, 256);
            let b = run_limited(&mut second, 256);
            prop_assert_eq!(a, b);
            prop_assert_eq!(first.flush_output(), second.flush_output());
            prop_assert!(first == second);
        }

        #[test]
        fn errors_poison(code in prop::collection::vec(-100i64..2300, 1..64)) {
            let mut machine = Machine::new(code);
            if let Some(Err(_)) = run_limited(&mut machine, 256) {
                prop_assert!(machine.is_poisoned());
                prop_assert_eq!(machine.step(), Err(MachineError::Poisoned));
                prop_assert_eq!(machine.run(), Err(MachineError::Poisoned));
            }
        }

        #[test]
        fn halted_stays_halted(
            prefix in prop::collection::vec(104i64..105, 0..8),
            tail in any::<i64>(),
        ) {
            // a run of `OUT #99` followed by HALT
            let mut code: Vec<i64> = prefix.iter().flat_map(|&op| [op, 99]).collect();
            code.extend([99, tail]);
            let mut machine = Machine::new(code);
            let outcome = machine.run();
            prop_assert!(matches!(outcome, Ok(Outcome::Halted(_))));
            prop_assert_eq!(machine.run(), outcome);
            prop_assert_eq!(machine.flush_output().len(), prefix.len());
        }
    }
}
