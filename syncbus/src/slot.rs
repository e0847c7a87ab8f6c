//! Slot buffers
//!
//! A slot is an untyped byte region owned by the application and borrowed
//! by a client or server binding. Regions are `[Cell<u8>]` so that a frame
//! can update them through a shared reference while the application still
//! holds its own view, including from inside a re-entrant send callback.

use core::cell::Cell;

use crate::error::{Error, Result};
use crate::frame;

/// Copy the current contents of `region` into `dst`
///
/// Both slices must have the same length.
pub fn read_into(region: &[Cell<u8>], dst: &mut [u8]) {
    for (byte, cell) in dst.iter_mut().zip(region) {
        *byte = cell.get();
    }
}

/// Overwrite `region` with `src`
///
/// Both slices must have the same length.
pub fn write_from(region: &[Cell<u8>], src: &[u8]) {
    for (cell, &byte) in region.iter().zip(src) {
        cell.set(byte);
    }
}

/// Check that `region` can be bound as a slot
///
/// An empty region is a fault, one too large for a single frame overflows.
pub(crate) fn check_region(region: &[Cell<u8>]) -> Result<()> {
    if region.is_empty() {
        return Err(Error::Fault);
    }
    if !frame::fits(region.len()) {
        return Err(Error::Overflow);
    }
    Ok(())
}

/// Fixed-size slot storage
///
/// Convenience owner for an `N`-byte region. Bind it with [`SlotCell::cells`]
/// and read or update it at any time with [`SlotCell::get`] / [`SlotCell::set`].
#[derive(Debug)]
pub struct SlotCell<const N: usize> {
    bytes: [Cell<u8>; N],
}

impl<const N: usize> SlotCell<N> {
    /// Create a slot holding `init`
    pub fn new(init: [u8; N]) -> Self {
        Self {
            bytes: init.map(Cell::new),
        }
    }

    /// Snapshot of the current contents
    pub fn get(&self) -> [u8; N] {
        let mut out = [0u8; N];
        read_into(&self.bytes, &mut out);
        out
    }

    /// Replace the contents
    pub fn set(&self, value: [u8; N]) {
        write_from(&self.bytes, &value);
    }

    /// The region to register with a client or server
    pub fn cells(&self) -> &[Cell<u8>] {
        &self.bytes
    }

    /// Slot size in bytes
    pub const fn len(&self) -> usize {
        N
    }

    /// Returns true for a zero-sized slot, which can never be registered
    pub const fn is_empty(&self) -> bool {
        N == 0
    }
}

impl<const N: usize> Default for SlotCell<N> {
    fn default() -> Self {
        Self::new([0u8; N])
    }
}
