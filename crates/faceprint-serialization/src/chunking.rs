// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Sequential program bursts
//!
//! An encoded store is written in `chunk_size` bursts at `base`,
//! `base + chunk_size`, `base + 2 * chunk_size`, ...; the last burst carries
//! the remainder. The encoded length alone decides where writing stops.

use crate::error::{CodecError, CodecResult};

/// One program burst
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Position in the plan, from zero
    pub index: usize,
    /// Absolute flash address
    pub address: u32,
    /// Offset into the encoded image
    pub offset: usize,
    /// Bytes in this burst (at most `chunk_size`)
    pub len: usize,
}

impl Chunk {
    /// This chunk's bytes within the full image
    pub fn slice<'a>(&self, image: &'a [u8]) -> &'a [u8] {
        &image[self.offset..self.offset + self.len]
    }
}

/// Split of `total_len` bytes into bursts starting at `base_address`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    base_address: u32,
    chunk_size: usize,
    total_len: usize,
}

impl ChunkPlan {
    /// Plan a write
    ///
    /// # Errors
    /// `InvalidChunkSize` for a zero chunk size, `AddressOverflow` when the
    /// image would not end within the 32-bit address space.
    pub fn new(base_address: u32, chunk_size: usize, total_len: usize) -> CodecResult<Self> {
        if chunk_size == 0 {
            return Err(CodecError::InvalidChunkSize);
        }
        let end = base_address as u64 + total_len as u64;
        if end > u32::MAX as u64 + 1 {
            return Err(CodecError::AddressOverflow {
                base_address,
                len: total_len,
            });
        }
        Ok(Self {
            base_address,
            chunk_size,
            total_len,
        })
    }

    pub fn base_address(&self) -> u32 {
        self.base_address
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn total_len(&self) -> usize {
        self.total_len
    }

    /// Number of bursts (zero for an empty image)
    pub fn chunk_count(&self) -> usize {
        self.total_len.div_ceil(self.chunk_size)
    }

    /// One past the last written address
    pub fn end_address(&self) -> u64 {
        self.base_address as u64 + self.total_len as u64
    }

    /// Bursts in write order
    pub fn chunks(&self) -> Chunks {
        Chunks {
            plan: *self,
            next_index: 0,
        }
    }
}

impl IntoIterator for &ChunkPlan {
    type Item = Chunk;
    type IntoIter = Chunks;

    fn into_iter(self) -> Chunks {
        self.chunks()
    }
}

/// Iterator over the bursts of a [`ChunkPlan`]
#[derive(Debug, Clone)]
pub struct Chunks {
    plan: ChunkPlan,
    next_index: usize,
}

impl Iterator for Chunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let offset = self.next_index * self.plan.chunk_size;
        if offset >= self.plan.total_len {
            return None;
        }
        let len = self.plan.chunk_size.min(self.plan.total_len - offset);
        // The plan was checked to end within the address space
        let address = (self.plan.base_address as u64 + offset as u64) as u32;
        let chunk = Chunk {
            index: self.next_index,
            address,
            offset,
            len,
        };
        self.next_index += 1;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.plan.chunk_count().saturating_sub(self.next_index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Chunks {}
