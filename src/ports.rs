// SPDX-FileCopyrightText: 2025 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Input and output bindings for a [Machine]
//!
//! A [Machine] reads through an [`InputPort`] and writes through an [`OutputPort`]. The default
//! bindings are a programmatic queue ([`QueueInput`]) and an in-memory buffer
//! ([`BufferOutput`]), which the host drives between calls to [`Machine::run`]. The other
//! bindings connect a machine to external streams or to other machines.
//!
//! [Machine]: crate::Machine
//! [`Machine::run`]: crate::Machine::run

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};

use thiserror::Error;

/// An error from an I/O port
#[derive(Debug, Error)]
pub enum PortError {
    /// Underlying reader or writer failed
    #[error("an I/O error occurred: {0}")]
    Io(#[from] io::Error),
    /// The input source ended, or the output destination went away
    #[error("the port was closed")]
    Closed,
}

/// Where a machine's `IN` instruction gets its values
pub trait InputPort {
    /// Get the next input value.
    ///
    /// `Ok(None)` means that no value is available without blocking, and the machine should
    /// suspend so the host can supply more.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] if the source failed or can never produce another value.
    fn next_input(&mut self) -> Result<Option<i64>, PortError>;

    /// Number of values available without blocking, if known
    fn pending(&self) -> Option<usize> {
        None
    }
}

/// Where a machine's `OUT` instruction sends its values
pub trait OutputPort {
    /// Send a value
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] if the value could not be delivered.
    fn emit(&mut self, value: i64) -> Result<(), PortError>;

    /// Number of values held back for the host to collect, if known
    fn buffered(&self) -> Option<usize> {
        None
    }
}

impl<P: InputPort + ?Sized> InputPort for &mut P {
    fn next_input(&mut self) -> Result<Option<i64>, PortError> {
        (**self).next_input()
    }
    fn pending(&self) -> Option<usize> {
        (**self).pending()
    }
}

impl<P: OutputPort + ?Sized> OutputPort for &mut P {
    fn emit(&mut self, value: i64) -> Result<(), PortError> {
        (**self).emit(value)
    }
    fn buffered(&self) -> Option<usize> {
        (**self).buffered()
    }
}

/// Programmatic FIFO input. Never blocks: when empty, the machine suspends.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct QueueInput(VecDeque<i64>);

impl QueueInput {
    /// Append values to the back of the queue
    pub fn extend(&mut self, values: impl IntoIterator<Item = i64>) {
        self.0.extend(values);
    }

    /// Append each character's code point to the back of the queue
    pub fn extend_ascii(&mut self, text: &str) {
        self.0.extend(text.chars().map(|c| i64::from(u32::from(c))));
    }

    /// Number of queued values
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drop all queued values
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// The queued values, front first
    pub fn iter(&self) -> impl Iterator<Item = &i64> {
        self.0.iter()
    }
}

impl FromIterator<i64> for QueueInput {
    fn from_iter<T: IntoIterator<Item = i64>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl InputPort for QueueInput {
    fn next_input(&mut self) -> Result<Option<i64>, PortError> {
        Ok(self.0.pop_front())
    }
    fn pending(&self) -> Option<usize> {
        Some(self.0.len())
    }
}

/// In-memory output, collected by the host
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BufferOutput(Vec<i64>);

impl BufferOutput {
    /// The buffered values, oldest first
    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    /// Take all buffered values, leaving the buffer empty
    pub fn take(&mut self) -> Vec<i64> {
        std::mem::take(&mut self.0)
    }
}

impl OutputPort for BufferOutput {
    fn emit(&mut self, value: i64) -> Result<(), PortError> {
        self.0.push(value);
        Ok(())
    }
    fn buffered(&self) -> Option<usize> {
        Some(self.0.len())
    }
}

/// Blocking input that reads one decimal integer per line.
///
/// Lines that don't parse are logged and skipped, and the next line is read instead.
#[derive(Debug)]
pub struct LineInput<R> {
    reader: R,
    buf: String,
}

impl<R: BufRead> LineInput<R> {
    /// Read lines from `reader`
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> InputPort for LineInput<R> {
    fn next_input(&mut self) -> Result<Option<i64>, PortError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Err(PortError::Closed);
            }
            match self.buf.trim().parse() {
                Ok(n) => return Ok(Some(n)),
                Err(e) => log::warn!("ignoring bad input {:?}: {e}", self.buf.trim_end()),
            }
        }
    }
}

/// Blocking input that feeds a whole line of text at a time, one byte per value, including the
/// trailing newline.
///
/// Lines containing non-ASCII characters are logged and skipped.
#[derive(Debug)]
pub struct AsciiLineInput<R> {
    reader: R,
    pending: VecDeque<i64>,
}

impl<R: BufRead> AsciiLineInput<R> {
    /// Read lines from `reader`
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
        }
    }
}

impl<R: BufRead> InputPort for AsciiLineInput<R> {
    fn next_input(&mut self) -> Result<Option<i64>, PortError> {
        let mut buf = String::new();
        while self.pending.is_empty() {
            buf.clear();
            if self.reader.read_line(&mut buf)? == 0 {
                return Err(PortError::Closed);
            }
            if let Some(bad_char) = buf.chars().find(|c| !c.is_ascii()) {
                log::warn!("ignoring line with non-ASCII character {bad_char:?}");
            } else {
                self.pending.extend(buf.bytes().map(i64::from));
            }
        }
        Ok(self.pending.pop_front())
    }

    fn pending(&self) -> Option<usize> {
        Some(self.pending.len())
    }
}

/// Output that writes each value on its own line, flushing after each one
#[derive(Debug)]
pub struct LineOutput<W>(W);

impl<W: Write> LineOutput<W> {
    /// Write values to `writer`
    pub fn new(writer: W) -> Self {
        Self(writer)
    }

    /// Unwrap the underlying writer
    pub fn into_inner(self) -> W {
        self.0
    }
}

impl<W: Write> OutputPort for LineOutput<W> {
    fn emit(&mut self, value: i64) -> Result<(), PortError> {
        writeln!(self.0, "{value}")?;
        self.0.flush()?;
        Ok(())
    }
}

/// Output that writes values in the ASCII range as text.
///
/// Values outside of it are written in decimal, on their own line.
#[derive(Debug)]
pub struct AsciiOutput<W>(W);

impl<W: Write> AsciiOutput<W> {
    /// Write values to `writer`
    pub fn new(writer: W) -> Self {
        Self(writer)
    }

    /// Unwrap the underlying writer
    pub fn into_inner(self) -> W {
        self.0
    }
}

impl<W: Write> OutputPort for AsciiOutput<W> {
    fn emit(&mut self, value: i64) -> Result<(), PortError> {
        match to_ascii(value) {
            Some('\n') => writeln!(self.0)?,
            Some(c) => {
                write!(self.0, "{c}")?;
                return Ok(());
            }
            None => writeln!(self.0, "{value}")?,
        }
        self.0.flush()?;
        Ok(())
    }
}

/// Input received from another thread, usually another machine's [`ChannelOutput`].
#[derive(Debug)]
pub struct ChannelInput {
    rx: Receiver<i64>,
    blocking: bool,
}

impl ChannelInput {
    /// Wait for values to arrive. Fails once every sender is gone and the channel is drained.
    pub fn blocking(rx: Receiver<i64>) -> Self {
        Self { rx, blocking: true }
    }

    /// Suspend whenever the channel is empty instead of waiting.
    pub fn non_blocking(rx: Receiver<i64>) -> Self {
        Self {
            rx,
            blocking: false,
        }
    }
}

impl InputPort for ChannelInput {
    fn next_input(&mut self) -> Result<Option<i64>, PortError> {
        if self.blocking {
            self.rx.recv().map(Some).map_err(|_| PortError::Closed)
        } else {
            match self.rx.try_recv() {
                Ok(n) => Ok(Some(n)),
                Err(TryRecvError::Empty) => Ok(None),
                Err(TryRecvError::Disconnected) => Err(PortError::Closed),
            }
        }
    }
}

/// Output sent to another thread
#[derive(Debug, Clone)]
pub struct ChannelOutput(Sender<i64>);

impl ChannelOutput {
    /// Send values through `tx`
    pub fn new(tx: Sender<i64>) -> Self {
        Self(tx)
    }
}

impl OutputPort for ChannelOutput {
    fn emit(&mut self, value: i64) -> Result<(), PortError> {
        self.0.send(value).map_err(|_| PortError::Closed)
    }
}

/// Convert `value` to a [char] if it's in the ASCII range
pub(crate) fn to_ascii(value: i64) -> Option<char> {
    u8::try_from(value)
        .ok()
        .filter(u8::is_ascii)
        .map(char::from)
}
