// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Byte stream <-> 16-bit flash word conversion
//!
//! Words are little-endian: byte `2i` is the low half of word `i`, byte
//! `2i + 1` the high half. An odd trailing byte is padded with the erase
//! pattern so the padding half of the word stays unprogrammed.

use crate::ERASED_BYTE;

/// Pack bytes into 16-bit words, low byte first
///
/// # Arguments
/// * `input` - Byte stream
/// * `output` - Word buffer, at least `ceil(input.len() / 2)` long
///
/// # Returns
/// Number of words written
pub fn pack_le(input: &[u8], output: &mut [u16]) -> usize {
    let word_count = (input.len() + 1) / 2;
    debug_assert!(output.len() >= word_count);

    for (word, pair) in output.iter_mut().zip(input.chunks(2)) {
        let low = pair[0] as u16;
        let high = pair.get(1).copied().unwrap_or(ERASED_BYTE) as u16;
        *word = (high << 8) | low;
    }

    word_count
}

/// Unpack 16-bit words into bytes, low byte first
///
/// Fills `output` completely; an odd `output` length drops the high half of
/// the last word.
///
/// # Arguments
/// * `input` - Word buffer, at least `ceil(output.len() / 2)` long
/// * `output` - Byte buffer to fill
pub fn unpack_le(input: &[u16], output: &mut [u8]) {
    debug_assert!(input.len() * 2 >= output.len());

    for (pair, word) in output.chunks_mut(2).zip(input.iter()) {
        pair[0] = (*word & 0x00FF) as u8;
        if let Some(high) = pair.get_mut(1) {
            *high = (*word >> 8) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_low_byte_first() {
        let mut words = [0u16; 2];
        let written = pack_le(&[0x34, 0x12, 0x78, 0x56], &mut words);
        assert_eq!(written, 2);
        assert_eq!(words, [0x1234, 0x5678]);
    }

    #[test]
    fn test_pack_odd_length_pads_with_erase_pattern() {
        let mut words = [0u16; 2];
        let written = pack_le(&[0x01, 0x02, 0x03], &mut words);
        assert_eq!(written, 2);
        assert_eq!(words, [0x0201, 0xFF03]);
    }

    #[test]
    fn test_unpack_inverts_pack() {
        let bytes = [9u8, 8, 7, 6, 5];
        let mut words = [0u16; 3];
        pack_le(&bytes, &mut words);

        let mut restored = [0u8; 5];
        unpack_le(&words, &mut restored);
        assert_eq!(restored, bytes);
    }

    #[test]
    fn test_signed_bytes_survive_packing() {
        let signed: [i8; 4] = [-1, -128, 127, 0];
        let bytes: [u8; 4] = signed.map(|v| v as u8);
        let mut words = [0u16; 2];
        pack_le(&bytes, &mut words);

        let mut restored = [0u8; 4];
        unpack_le(&words, &mut restored);
        assert_eq!(restored.map(|v| v as i8), signed);
    }
}
