// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use core::fmt::Debug;

/// Native program granularity of a flash device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordWidth {
    /// 8-bit words (bytes are programmed as-is)
    Byte,
    /// 16-bit words (two bytes per word, low byte first)
    HalfWord,
}

impl WordWidth {
    /// Number of bytes in one native word
    pub const fn bytes_per_word(&self) -> usize {
        match self {
            WordWidth::Byte => 1,
            WordWidth::HalfWord => 2,
        }
    }

    /// Number of native words needed to hold `byte_len` bytes
    pub const fn words_for(&self, byte_len: usize) -> usize {
        let per_word = self.bytes_per_word();
        (byte_len + per_word - 1) / per_word
    }

    /// Get word width as string
    pub fn as_str(&self) -> &'static str {
        match self {
            WordWidth::Byte => "8-bit",
            WordWidth::HalfWord => "16-bit",
        }
    }
}

/// Device status as reported by a status poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlashStatus {
    /// True while an erase or program operation is still in progress
    pub busy: bool,
}

impl FlashStatus {
    /// Status of an idle device
    pub const READY: FlashStatus = FlashStatus { busy: false };

    /// Status of a device that is still working
    pub const BUSY: FlashStatus = FlashStatus { busy: true };
}

/// Words handed to a device for programming, in the device's native width
#[derive(Debug, Clone, Copy)]
pub enum FlashWords<'a> {
    /// 8-bit words
    Bytes(&'a [u8]),
    /// 16-bit words
    HalfWords(&'a [u16]),
}

impl FlashWords<'_> {
    /// Width of the contained words
    pub fn width(&self) -> WordWidth {
        match self {
            FlashWords::Bytes(_) => WordWidth::Byte,
            FlashWords::HalfWords(_) => WordWidth::HalfWord,
        }
    }

    /// Number of bytes covered by the contained words
    pub fn byte_len(&self) -> usize {
        match self {
            FlashWords::Bytes(bytes) => bytes.len(),
            FlashWords::HalfWords(words) => words.len() * 2,
        }
    }
}

/// Destination buffer for a device read, in the device's native width
#[derive(Debug)]
pub enum FlashWordsMut<'a> {
    /// 8-bit words
    Bytes(&'a mut [u8]),
    /// 16-bit words
    HalfWords(&'a mut [u16]),
}

impl FlashWordsMut<'_> {
    /// Width of the contained words
    pub fn width(&self) -> WordWidth {
        match self {
            FlashWordsMut::Bytes(_) => WordWidth::Byte,
            FlashWordsMut::HalfWords(_) => WordWidth::HalfWord,
        }
    }

    /// Number of bytes covered by the contained words
    pub fn byte_len(&self) -> usize {
        match self {
            FlashWordsMut::Bytes(bytes) => bytes.len(),
            FlashWordsMut::HalfWords(words) => words.len() * 2,
        }
    }
}

/// Raw NOR/OSPI flash device
///
/// Implementations issue the hardware command and return immediately; a
/// `program` or `erase` is only complete once `poll_status` reports
/// `busy == false`. Waiting is the job of
/// [`FlashAdapter`](crate::adapter::FlashAdapter), never of the device.
///
/// Addresses are absolute byte addresses in the device's memory map.
pub trait NorFlash {
    /// Platform-specific error type
    type Error: Debug;

    /// Native program granularity
    fn word_width(&self) -> WordWidth;

    /// First addressable byte of the device window
    fn base_address(&self) -> u32;

    /// Size of the device window in bytes
    fn capacity_bytes(&self) -> u32;

    /// Start a whole-device erase
    ///
    /// # Returns
    /// Ok(()) once the command is accepted, or error
    fn erase(&mut self) -> Result<(), Self::Error>;

    /// Start programming `words` at `address`
    ///
    /// # Arguments
    /// * `address` - Absolute byte address (word aligned)
    /// * `words` - Words in the device's native width
    ///
    /// # Returns
    /// Ok(()) once the command is accepted, or error
    fn program(&mut self, address: u32, words: FlashWords<'_>) -> Result<(), Self::Error>;

    /// Read words starting at `address`
    ///
    /// # Arguments
    /// * `address` - Absolute byte address (word aligned)
    /// * `buffer` - Buffer to fill, in the device's native width
    fn read(&mut self, address: u32, buffer: FlashWordsMut<'_>) -> Result<(), Self::Error>;

    /// Query the device status register
    fn poll_status(&mut self) -> Result<FlashStatus, Self::Error>;

    /// Exclusive end of the device window
    fn end_address(&self) -> u64 {
        self.base_address() as u64 + self.capacity_bytes() as u64
    }
}
