// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Flash adapter: synchronous erase/program/read over a [`NorFlash`] device
//!
//! Every command that leaves the device busy is followed by a status-poll
//! loop. The adapter does not return until the device reports ready or the
//! poll timeout (measured on the injected [`TimeProvider`]) runs out.

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

use crate::error::{FlashError, FlashOperation, FlashResult};
use crate::hal::{FlashStatus, FlashWords, FlashWordsMut, NorFlash, TimeProvider, WordWidth};
use crate::packing::{pack_le, unpack_le};

/// Largest chunk accepted by a single `program` call
pub const MAX_CHUNK_BYTES: usize = 256;

const MAX_CHUNK_WORDS: usize = MAX_CHUNK_BYTES / 2;

/// Busy-poll timeout configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashAdapterConfig {
    /// Maximum time to wait for a program to complete (microseconds)
    pub program_timeout_us: u64,

    /// Maximum time to wait for an erase to complete (microseconds)
    pub erase_timeout_us: u64,

    /// Delay between two status polls (microseconds, minimum 1)
    pub poll_interval_us: u32,
}

impl Default for FlashAdapterConfig {
    fn default() -> Self {
        Self {
            program_timeout_us: 100_000,     // 100 ms per chunk
            erase_timeout_us: 120_000_000,   // whole-chip erase on OSPI parts takes minutes at worst
            poll_interval_us: 10,
        }
    }
}

/// Operation counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlashStats {
    /// Completed erases
    pub erases: u32,
    /// Completed program commands
    pub programs: u32,
    /// Bytes covered by completed program commands
    pub bytes_programmed: u64,
    /// Completed reads
    pub reads: u32,
    /// Bytes read
    pub bytes_read: u64,
    /// Status polls issued
    pub status_polls: u64,
}

/// Busy-poll aware flash adapter
///
/// Owns the device and the clock; there is exactly one writer per device.
pub struct FlashAdapter<D: NorFlash, T: TimeProvider> {
    device: D,
    clock: T,
    config: FlashAdapterConfig,
    stats: FlashStats,
}

impl<D: NorFlash, T: TimeProvider> FlashAdapter<D, T> {
    /// Wrap a device
    pub fn new(device: D, clock: T, config: FlashAdapterConfig) -> Self {
        tracing::debug!(
            "[FLASH] Adapter over {}-byte {} device at 0x{:08X}",
            device.capacity_bytes(),
            device.word_width().as_str(),
            device.base_address()
        );
        Self {
            device,
            clock,
            config,
            stats: FlashStats::default(),
        }
    }

    /// Busy-poll configuration
    pub fn config(&self) -> &FlashAdapterConfig {
        &self.config
    }

    /// Operation counters since construction
    pub fn stats(&self) -> FlashStats {
        self.stats
    }

    /// Native word width of the device
    pub fn word_width(&self) -> WordWidth {
        self.device.word_width()
    }

    /// Borrow the device
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Mutably borrow the device
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Borrow the clock
    pub fn clock(&self) -> &T {
        &self.clock
    }

    /// Release the device and clock
    pub fn into_parts(self) -> (D, T) {
        (self.device, self.clock)
    }

    /// Erase the whole device and wait for completion
    pub fn erase(&mut self) -> FlashResult<()> {
        let address = self.device.base_address();
        tracing::debug!("[FLASH] Erasing device at 0x{:08X}", address);

        self.device
            .erase()
            .map_err(|e| device_error(FlashOperation::Erase, address, &e))?;
        self.wait_until_ready(FlashOperation::Erase, address, self.config.erase_timeout_us)?;

        self.stats.erases += 1;
        Ok(())
    }

    /// Program `bytes` at `address` and wait for completion
    ///
    /// On 16-bit devices the bytes are packed two per word, low byte first.
    ///
    /// # Arguments
    /// * `address` - Absolute byte address
    /// * `bytes` - At most [`MAX_CHUNK_BYTES`] bytes
    pub fn program(&mut self, address: u32, bytes: &[u8]) -> FlashResult<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        if bytes.len() > MAX_CHUNK_BYTES {
            return Err(FlashError::ChunkTooLarge {
                len: bytes.len(),
                max: MAX_CHUNK_BYTES,
            });
        }

        let width = self.device.word_width();
        self.check_access(address, bytes.len(), width)?;

        match width {
            WordWidth::Byte => self
                .device
                .program(address, FlashWords::Bytes(bytes))
                .map_err(|e| device_error(FlashOperation::Program, address, &e))?,
            WordWidth::HalfWord => {
                let mut words: heapless::Vec<u16, MAX_CHUNK_WORDS> = heapless::Vec::new();
                words
                    .resize(width.words_for(bytes.len()), 0)
                    .map_err(|_| FlashError::ChunkTooLarge {
                        len: bytes.len(),
                        max: MAX_CHUNK_BYTES,
                    })?;
                pack_le(bytes, &mut words);
                self.device
                    .program(address, FlashWords::HalfWords(&words))
                    .map_err(|e| device_error(FlashOperation::Program, address, &e))?;
            }
        }

        self.wait_until_ready(
            FlashOperation::Program,
            address,
            self.config.program_timeout_us,
        )?;

        self.stats.programs += 1;
        self.stats.bytes_programmed += bytes.len() as u64;
        tracing::trace!(
            "[FLASH] Programmed {} bytes at 0x{:08X}",
            bytes.len(),
            address
        );
        Ok(())
    }

    /// Read `len` bytes starting at `address`
    ///
    /// On 16-bit devices whole words are read and unpacked, low byte first.
    pub fn read(&mut self, address: u32, len: usize) -> FlashResult<Vec<u8>> {
        if len == 0 {
            return Ok(Vec::new());
        }

        let width = self.device.word_width();
        self.check_access(address, len, width)?;

        let bytes = match width {
            WordWidth::Byte => {
                let mut buffer = vec![0u8; len];
                self.device
                    .read(address, FlashWordsMut::Bytes(&mut buffer))
                    .map_err(|e| device_error(FlashOperation::Read, address, &e))?;
                buffer
            }
            WordWidth::HalfWord => {
                let mut words = vec![0u16; width.words_for(len)];
                self.device
                    .read(address, FlashWordsMut::HalfWords(&mut words))
                    .map_err(|e| device_error(FlashOperation::Read, address, &e))?;
                let mut buffer = vec![0u8; len];
                unpack_le(&words, &mut buffer);
                buffer
            }
        };

        self.stats.reads += 1;
        self.stats.bytes_read += len as u64;
        Ok(bytes)
    }

    /// Query the device status once
    pub fn poll_status(&mut self) -> FlashResult<FlashStatus> {
        let address = self.device.base_address();
        self.poll_once(FlashOperation::PollStatus, address)
    }

    fn poll_once(&mut self, operation: FlashOperation, address: u32) -> FlashResult<FlashStatus> {
        self.stats.status_polls += 1;
        self.device
            .poll_status()
            .map_err(|e| device_error(operation, address, &e))
    }

    /// Spin on the status register until the device reports ready
    fn wait_until_ready(
        &mut self,
        operation: FlashOperation,
        address: u32,
        timeout_us: u64,
    ) -> FlashResult<()> {
        let started_us = self.clock.get_time_us();
        let interval_us = self.config.poll_interval_us.max(1);

        loop {
            if !self.poll_once(operation, address)?.busy {
                return Ok(());
            }

            let waited_us = self.clock.get_time_us().saturating_sub(started_us);
            if waited_us >= timeout_us {
                tracing::warn!(
                    "[FLASH] Device still busy after {} us during {} at 0x{:08X}",
                    waited_us,
                    operation.as_str(),
                    address
                );
                return Err(FlashError::BusyTimeout {
                    operation,
                    address,
                    waited_us,
                });
            }

            self.clock.delay_us(interval_us);
        }
    }

    fn check_access(&self, address: u32, len: usize, width: WordWidth) -> FlashResult<()> {
        let alignment = width.bytes_per_word();
        if address as usize % alignment != 0 {
            return Err(FlashError::Misaligned { address, alignment });
        }

        let covered = (width.words_for(len) * alignment) as u64;
        let window_end = self.device.end_address();
        let start = address as u64;
        if start < self.device.base_address() as u64 || start + covered > window_end {
            return Err(FlashError::AddressOutOfRange {
                address,
                len,
                window_end,
            });
        }

        Ok(())
    }
}

fn device_error<E: core::fmt::Debug>(
    operation: FlashOperation,
    address: u32,
    error: &E,
) -> FlashError {
    tracing::error!(
        "[FLASH] Device error during {} at 0x{:08X}: {:?}",
        operation.as_str(),
        address,
        error
    );
    FlashError::Device {
        operation,
        address,
        detail: format!("{:?}", error),
    }
}
