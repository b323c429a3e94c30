// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Template store <-> flash region
//!
//! A persistence pass serialises the whole store, checks that it fits the
//! region, erases the device once and programs the image in sequential
//! chunks. Nothing is erased when the image does not fit.

use faceprint_hal::{FlashAdapter, NorFlash, TimeProvider, WordWidth, MAX_CHUNK_BYTES};
use faceprint_serialization::{
    decode_or_empty, inspect_header, serialize, ChunkPlan, HeaderStatus, HEADER_LEN,
};
use faceprint_templates::TemplateStore;
use tracing::{debug, error, info, warn};

use crate::error::{PersistError, PersistResult};

/// Where the store lives on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashLayout {
    /// First byte of the region
    pub base_address: u32,
    /// Region size in bytes
    pub region_size: u32,
    /// Bytes per program burst
    pub chunk_size: usize,
}

impl FlashLayout {
    /// OSPI memory-mapped window used by the reference board
    pub const DEFAULT_BASE_ADDRESS: u32 = 0xC000_0000;
    pub const DEFAULT_REGION_SIZE: u32 = 64 * 1024;
    pub const DEFAULT_CHUNK_SIZE: usize = 32;

    /// One past the last region byte
    pub fn end_address(&self) -> u64 {
        self.base_address as u64 + self.region_size as u64
    }

    /// Check the layout against a device
    ///
    /// # Errors
    /// `InvalidLayout` describing the first violated constraint
    pub fn validate_for(&self, width: WordWidth, window: (u32, u64)) -> PersistResult<()> {
        let invalid =
            |reason: String| -> PersistResult<()> { Err(PersistError::InvalidLayout(reason)) };

        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_BYTES {
            return invalid(format!(
                "chunk size {} outside 1..={}",
                self.chunk_size, MAX_CHUNK_BYTES
            ));
        }
        if width == WordWidth::HalfWord
            && (self.chunk_size % 2 != 0 || self.base_address % 2 != 0)
        {
            return invalid(format!(
                "16-bit device needs even base address and chunk size (0x{:08X}, {})",
                self.base_address, self.chunk_size
            ));
        }
        if (self.region_size as usize) < HEADER_LEN {
            return invalid(format!(
                "region of {} bytes cannot hold the {}-byte header",
                self.region_size, HEADER_LEN
            ));
        }
        if self.end_address() > u32::MAX as u64 + 1 {
            return invalid(format!(
                "region 0x{:08X} + {} overflows the address space",
                self.base_address, self.region_size
            ));
        }
        let (window_start, window_end) = window;
        if self.base_address < window_start || self.end_address() > window_end {
            return invalid(format!(
                "region 0x{:08X}..0x{:08X} outside device window 0x{:08X}..0x{:08X}",
                self.base_address,
                self.end_address(),
                window_start,
                window_end
            ));
        }
        Ok(())
    }
}

impl Default for FlashLayout {
    fn default() -> Self {
        Self {
            base_address: Self::DEFAULT_BASE_ADDRESS,
            region_size: Self::DEFAULT_REGION_SIZE,
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Summary of a completed persistence pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistReport {
    /// Encoded image size
    pub bytes_written: usize,
    /// Program commands issued
    pub chunks: usize,
    /// True when the image was read back and compared
    pub verified: bool,
}

/// Durable storage for a template store
pub trait TemplatePersistence {
    /// Replace the stored image with `store`
    fn persist(&mut self, store: &TemplateStore) -> PersistResult<PersistReport>;

    /// Load the stored image; erased or corrupt content yields an empty store
    fn load(&mut self) -> PersistResult<TemplateStore>;
}

/// Template persistence on a raw NOR flash region
pub struct FlashPersistence<D: NorFlash, T: TimeProvider> {
    adapter: FlashAdapter<D, T>,
    layout: FlashLayout,
    verify_after_persist: bool,
}

impl<D: NorFlash, T: TimeProvider> FlashPersistence<D, T> {
    /// Bind a layout to an adapter
    ///
    /// # Errors
    /// `InvalidLayout` when the region does not fit the device
    pub fn new(adapter: FlashAdapter<D, T>, layout: FlashLayout) -> PersistResult<Self> {
        let device = adapter.device();
        layout.validate_for(
            adapter.word_width(),
            (device.base_address(), device.end_address()),
        )?;
        Ok(Self {
            adapter,
            layout,
            verify_after_persist: false,
        })
    }

    /// Read the image back after every pass and compare it
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify_after_persist = verify;
        self
    }

    pub fn layout(&self) -> &FlashLayout {
        &self.layout
    }

    pub fn adapter(&self) -> &FlashAdapter<D, T> {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut FlashAdapter<D, T> {
        &mut self.adapter
    }

    pub fn into_adapter(self) -> FlashAdapter<D, T> {
        self.adapter
    }

    /// Read `len` bytes from the start of the region
    pub fn read_image(&mut self, len: usize) -> PersistResult<Vec<u8>> {
        let len = len.min(self.layout.region_size as usize);
        Ok(self.adapter.read(self.layout.base_address, len)?)
    }

    fn verify(&mut self, image: &[u8]) -> PersistResult<()> {
        let stored = self.read_image(image.len())?;
        if let Some(offset) = stored.iter().zip(image).position(|(a, b)| a != b) {
            error!(
                "[PERSIST] Read-back mismatch at 0x{:08X} (offset {})",
                self.layout.base_address as u64 + offset as u64,
                offset
            );
            return Err(PersistError::VerifyMismatch { offset });
        }
        Ok(())
    }
}

impl<D: NorFlash, T: TimeProvider> TemplatePersistence for FlashPersistence<D, T> {
    fn persist(&mut self, store: &TemplateStore) -> PersistResult<PersistReport> {
        let image = serialize(store)?;
        let available = self.layout.region_size as usize;
        if image.len() > available {
            error!(
                "[PERSIST] Encoded store ({} bytes) exceeds region of {} bytes at 0x{:08X}; flash untouched",
                image.len(),
                available,
                self.layout.base_address
            );
            return Err(PersistError::RegionOverflow {
                required: image.len(),
                available,
            });
        }

        let plan = ChunkPlan::new(self.layout.base_address, self.layout.chunk_size, image.len())?;

        self.adapter.erase()?;
        for chunk in &plan {
            self.adapter
                .program(chunk.address, chunk.slice(&image))
                .map_err(|e| {
                    error!(
                        "[PERSIST] Chunk {}/{} ({} bytes at 0x{:08X}) failed: {}",
                        chunk.index + 1,
                        plan.chunk_count(),
                        chunk.len,
                        chunk.address,
                        e
                    );
                    e
                })?;
        }

        if self.verify_after_persist {
            self.verify(&image)?;
        }

        info!(
            "[PERSIST] Wrote {} identities ({} bytes, {} chunks) at 0x{:08X}",
            store.len(),
            image.len(),
            plan.chunk_count(),
            self.layout.base_address
        );
        Ok(PersistReport {
            bytes_written: image.len(),
            chunks: plan.chunk_count(),
            verified: self.verify_after_persist,
        })
    }

    fn load(&mut self) -> PersistResult<TemplateStore> {
        let header = self.read_image(HEADER_LEN)?;
        let total_len = match inspect_header(&header) {
            HeaderStatus::Erased => {
                info!("[PERSIST] No stored templates (region erased)");
                return Ok(TemplateStore::new());
            }
            HeaderStatus::Invalid(err) => {
                warn!("[PERSIST] Ignoring region contents: {}", err);
                return Ok(TemplateStore::new());
            }
            HeaderStatus::Valid(header) => header.total_len(),
        };

        if total_len > self.layout.region_size as usize {
            warn!(
                "[PERSIST] Header claims {} bytes, region holds {}; ignoring",
                total_len, self.layout.region_size
            );
            return Ok(TemplateStore::new());
        }

        debug!("[PERSIST] Reading {} byte image", total_len);
        let image = self.read_image(total_len)?;
        Ok(decode_or_empty(&image))
    }
}
