// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-memory NOR flash
//!
//! Behaves like an OSPI NOR part as far as the adapter can observe:
//! - erase sets every cell to `0xFF`
//! - programming can only clear bits (`cell &= value`)
//! - every erase/program leaves the device busy for a configurable number of polls
//! - commands issued while busy are rejected

use alloc::vec;
use alloc::vec::Vec;

use crate::hal::{FlashStatus, FlashWords, FlashWordsMut, NorFlash, WordWidth};
use crate::ERASED_BYTE;

/// Command observed by the simulated device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashOp {
    /// Whole-device erase
    Erase,
    /// Program command (`len` in bytes)
    Program {
        /// Absolute byte address
        address: u32,
        /// Bytes covered by the command
        len: usize,
    },
    /// Read command (`len` in bytes)
    Read {
        /// Absolute byte address
        address: u32,
        /// Bytes covered by the command
        len: usize,
    },
}

/// Simulated device errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedFlashError {
    /// Access outside the device window
    OutOfRange {
        /// Absolute byte address
        address: u32,
        /// Bytes requested
        len: usize,
    },
    /// Words of the wrong width for this device
    WidthMismatch {
        /// Device width
        expected: WordWidth,
        /// Width supplied
        actual: WordWidth,
    },
    /// Command issued before the previous one completed
    Busy,
    /// Failure injected by a test
    InjectedFault,
}

/// In-memory NOR flash device
#[derive(Debug, Clone)]
pub struct SimulatedNorFlash {
    base_address: u32,
    width: WordWidth,
    cells: Vec<u8>,
    busy_polls_per_op: u32,
    busy_remaining: u32,
    stuck_busy: bool,
    program_faults: u32,
    operations: Vec<FlashOp>,
}

impl SimulatedNorFlash {
    /// Create a device of `capacity` bytes at `base_address`
    ///
    /// A fresh device reads as erased.
    pub fn new(base_address: u32, capacity: u32, width: WordWidth) -> Self {
        Self {
            base_address,
            width,
            cells: vec![ERASED_BYTE; capacity as usize],
            busy_polls_per_op: 1,
            busy_remaining: 0,
            stuck_busy: false,
            program_faults: 0,
            operations: Vec::new(),
        }
    }

    /// Number of polls that report busy after each erase/program
    pub fn set_busy_polls_per_op(&mut self, polls: u32) {
        self.busy_polls_per_op = polls;
    }

    /// Make the status register report busy forever
    ///
    /// Commands are still accepted; they just never report completion.
    pub fn set_stuck_busy(&mut self, stuck: bool) {
        self.stuck_busy = stuck;
    }

    /// Fail the next `count` program commands
    pub fn inject_program_faults(&mut self, count: u32) {
        self.program_faults = count;
    }

    /// Commands observed since construction (or the last `clear_operations`)
    pub fn operations(&self) -> &[FlashOp] {
        &self.operations
    }

    /// Forget the observed commands
    pub fn clear_operations(&mut self) {
        self.operations.clear();
    }

    /// Number of program commands observed
    pub fn program_count(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, FlashOp::Program { .. }))
            .count()
    }

    /// Number of erase commands observed
    pub fn erase_count(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, FlashOp::Erase))
            .count()
    }

    /// Raw contents of the whole device window
    pub fn contents(&self) -> &[u8] {
        &self.cells
    }

    /// Raw contents of `len` bytes at an absolute address
    pub fn contents_at(&self, address: u32, len: usize) -> Option<&[u8]> {
        let offset = address.checked_sub(self.base_address)? as usize;
        self.cells.get(offset..offset.checked_add(len)?)
    }

    fn offset_for(&self, address: u32, len: usize) -> Result<usize, SimulatedFlashError> {
        let out_of_range = SimulatedFlashError::OutOfRange { address, len };
        let offset = address.checked_sub(self.base_address).ok_or(out_of_range)? as usize;
        match offset.checked_add(len) {
            Some(end) if end <= self.cells.len() => Ok(offset),
            _ => Err(out_of_range),
        }
    }

    fn ensure_idle(&self) -> Result<(), SimulatedFlashError> {
        if self.busy_remaining > 0 {
            return Err(SimulatedFlashError::Busy);
        }
        Ok(())
    }

    fn start_operation(&mut self) {
        self.busy_remaining = self.busy_polls_per_op;
    }
}

impl NorFlash for SimulatedNorFlash {
    type Error = SimulatedFlashError;

    fn word_width(&self) -> WordWidth {
        self.width
    }

    fn base_address(&self) -> u32 {
        self.base_address
    }

    fn capacity_bytes(&self) -> u32 {
        self.cells.len() as u32
    }

    fn erase(&mut self) -> Result<(), Self::Error> {
        self.ensure_idle()?;
        self.cells.fill(ERASED_BYTE);
        self.operations.push(FlashOp::Erase);
        self.start_operation();
        Ok(())
    }

    fn program(&mut self, address: u32, words: FlashWords<'_>) -> Result<(), Self::Error> {
        self.ensure_idle()?;
        if words.width() != self.width {
            return Err(SimulatedFlashError::WidthMismatch {
                expected: self.width,
                actual: words.width(),
            });
        }
        if self.program_faults > 0 {
            self.program_faults -= 1;
            return Err(SimulatedFlashError::InjectedFault);
        }

        let len = words.byte_len();
        let offset = self.offset_for(address, len)?;
        let cells = &mut self.cells[offset..offset + len];
        match words {
            FlashWords::Bytes(bytes) => {
                for (cell, byte) in cells.iter_mut().zip(bytes) {
                    *cell &= *byte;
                }
            }
            FlashWords::HalfWords(half_words) => {
                for (pair, word) in cells.chunks_mut(2).zip(half_words) {
                    pair[0] &= (*word & 0x00FF) as u8;
                    pair[1] &= (*word >> 8) as u8;
                }
            }
        }

        self.operations.push(FlashOp::Program { address, len });
        self.start_operation();
        Ok(())
    }

    fn read(&mut self, address: u32, buffer: FlashWordsMut<'_>) -> Result<(), Self::Error> {
        self.ensure_idle()?;
        if buffer.width() != self.width {
            return Err(SimulatedFlashError::WidthMismatch {
                expected: self.width,
                actual: buffer.width(),
            });
        }

        let len = buffer.byte_len();
        let offset = self.offset_for(address, len)?;
        let cells = &self.cells[offset..offset + len];
        match buffer {
            FlashWordsMut::Bytes(bytes) => bytes.copy_from_slice(cells),
            FlashWordsMut::HalfWords(half_words) => {
                for (word, pair) in half_words.iter_mut().zip(cells.chunks(2)) {
                    *word = ((pair[1] as u16) << 8) | pair[0] as u16;
                }
            }
        }

        self.operations.push(FlashOp::Read { address, len });
        Ok(())
    }

    fn poll_status(&mut self) -> Result<FlashStatus, Self::Error> {
        if self.stuck_busy {
            return Ok(FlashStatus::BUSY);
        }
        if self.busy_remaining > 0 {
            self.busy_remaining -= 1;
            return Ok(FlashStatus::BUSY);
        }
        Ok(FlashStatus::READY)
    }
}
