// SPDX-FileCopyrightText: 2025 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! The Program Store: a single, contiguous, zero-extended memory.

use itertools::Itertools;
use std::borrow::Cow;
use std::fmt;
use std::ops::{Index, IndexMut, Range};

use crate::{MachineError, NegativeMemAccess, OutOfMemory};

static ZERO: i64 = 0;

/// Intcode memory
///
/// Conceptually infinite: any address past [`len`](Memory::len) reads as `0`. Reading never
/// allocates. Writing to an address past the end grows the store to exactly `address + 1`, with
/// no extra capacity reserved up front.
///
/// # Example
///
/// ```
/// use intcode::Memory;
/// let mut mem: Memory = [1, 2, 3].into_iter().collect();
/// assert_eq!(mem.read(100), Ok(0));
/// assert_eq!(mem.len(), 3);
///
/// mem.write(9, 42).unwrap();
/// assert_eq!(mem.len(), 10);
/// assert_eq!(mem.read(9), Ok(42));
/// ```
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Memory {
    cells: Vec<i64>,
}

impl Memory {
    /// Number of cells currently backed by storage
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the store has no backed cells at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The backed cells, starting at address 0
    #[must_use]
    pub fn as_slice(&self) -> &[i64] {
        &self.cells
    }

    /// Guarantee that `address` is backed by storage, growing to exactly `address + 1` cells if
    /// it isn't already.
    ///
    /// # Errors
    ///
    /// If the space can't be allocated, returns an [`OutOfMemory`] error, and memory is unchanged.
    pub fn ensure_addressable(&mut self, address: usize) -> Result<(), OutOfMemory> {
        if address < self.cells.len() {
            return Ok(());
        }
        let oom = || OutOfMemory(address as u64);
        let new_len = address.checked_add(1).ok_or_else(oom)?;
        self.cells
            .try_reserve_exact(new_len - self.cells.len())
            .map_err(|_| oom())?;
        self.cells.resize(new_len, 0);
        Ok(())
    }

    /// Read the value at `address`
    ///
    /// # Errors
    ///
    /// If `address` is negative, returns a [`NegativeMemAccess`] error.
    pub fn read(&self, address: i64) -> Result<i64, NegativeMemAccess> {
        let address = u64::try_from(address).map_err(|_| NegativeMemAccess(address))?;
        Ok(usize::try_from(address).map_or(0, |i| self[i]))
    }

    /// Write `value` to `address`, growing the store if needed
    ///
    /// # Errors
    ///
    /// If `address` is negative, returns [`MachineError::NegativeMemAccess`]. If the store can't
    /// grow to hold it, returns [`MachineError::OutOfMemory`]. Memory is unchanged either way.
    pub fn write(&mut self, address: i64, value: i64) -> Result<(), MachineError> {
        let address = u64::try_from(address).map_err(|_| NegativeMemAccess(address))?;
        let i = usize::try_from(address).map_err(|_| OutOfMemory(address))?;
        self.ensure_addressable(i)?;
        self.cells[i] = value;
        Ok(())
    }

    /// Get a range of memory, zero-filled past the end of the backed cells.
    ///
    /// Borrowed if it's fully backed, otherwise an owned copy.
    #[must_use]
    pub fn get_range(&self, range: Range<usize>) -> Cow<'_, [i64]> {
        if range.end <= self.cells.len() {
            Cow::Borrowed(&self.cells[range])
        } else {
            let mut v = Vec::with_capacity(range.len());
            if range.start < self.cells.len() {
                v.extend_from_slice(&self.cells[range.start..]);
            }
            v.resize(range.len(), 0);
            Cow::Owned(v)
        }
    }
}

impl Index<usize> for Memory {
    type Output = i64;
    fn index(&self, i: usize) -> &i64 {
        self.cells.get(i).unwrap_or(&ZERO)
    }
}

/// # Panics
///
/// Panics if the store can't grow to hold `i`. [`Memory::write`] reports that as an error.
impl IndexMut<usize> for Memory {
    fn index_mut(&mut self, i: usize) -> &mut i64 {
        if let Err(e) = self.ensure_addressable(i) {
            panic!("{e}");
        }
        &mut self.cells[i]
    }
}

impl FromIterator<i64> for Memory {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Memory {
    type Item = i64;
    type IntoIter = std::vec::IntoIter<i64>;
    fn into_iter(self) -> Self::IntoIter {
        self.cells.into_iter()
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 16 cells per row, keyed by the address of the first cell
        let mut map = fmt.debug_map();
        for (row, chunk) in self.cells.chunks(16).enumerate() {
            map.entry(
                &format_args!("{:04}", row * 16),
                &format_args!("{}", chunk.iter().join(",")),
            );
        }
        map.finish()
    }
}
