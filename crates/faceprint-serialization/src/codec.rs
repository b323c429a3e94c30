// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Template store encode/decode

use byteorder::{ByteOrder, LittleEndian};
use faceprint_templates::{Embedding, IdentityRecord, TemplateStore};
use tracing::{debug, info, warn};

use crate::error::{CodecError, CodecResult};
use crate::format::{inspect_header, Header, HeaderStatus, HEADER_LEN};

const NAME_LEN_BYTES: usize = 1;
const SAMPLE_COUNT_BYTES: usize = 1;
const VEC_LEN_BYTES: usize = 2;

//region Encoding

/// Exact size of `serialize(store)` in bytes
pub fn encoded_len(store: &TemplateStore) -> usize {
    HEADER_LEN + payload_len(store)
}

fn payload_len(store: &TemplateStore) -> usize {
    store
        .iter()
        .map(|record| {
            NAME_LEN_BYTES
                + record.name().len()
                + SAMPLE_COUNT_BYTES
                + record
                    .samples()
                    .iter()
                    .map(|s| VEC_LEN_BYTES + s.len())
                    .sum::<usize>()
        })
        .sum()
}

/// Encode the payload section only (no header)
///
/// Record invariants guarantee every length fits its field: names are at
/// most 255 bytes, records hold at most 5 samples and embeddings at most
/// `u16::MAX` values.
pub fn serialize_payload(store: &TemplateStore) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload_len(store));
    for record in store {
        out.push(record.name().len() as u8);
        out.extend_from_slice(record.name().as_bytes());
        out.push(record.sample_count() as u8);
        for sample in record.samples() {
            let mut vec_len = [0u8; VEC_LEN_BYTES];
            LittleEndian::write_u16(&mut vec_len, sample.len() as u16);
            out.extend_from_slice(&vec_len);
            out.extend(sample.as_slice().iter().map(|v| *v as u8));
        }
    }
    out
}

/// Encode a store as header + payload
pub fn serialize(store: &TemplateStore) -> CodecResult<Vec<u8>> {
    let payload = serialize_payload(store);
    let header = Header::for_payload(&payload)?;

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(&payload);

    debug!(
        "[CODEC] Serialized {} identities ({} samples) into {} bytes",
        store.len(),
        store.total_samples(),
        out.len()
    );
    Ok(out)
}

//endregion

//region Decoding

struct PayloadReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> PayloadReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn take(&mut self, len: usize, field: &'static str) -> CodecResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(CodecError::Truncated {
                field,
                offset: self.offset,
                needed: len,
                available: self.remaining(),
            });
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn read_u8(&mut self, field: &'static str) -> CodecResult<u8> {
        Ok(self.take(1, field)?[0])
    }

    fn read_u16(&mut self, field: &'static str) -> CodecResult<u16> {
        Ok(LittleEndian::read_u16(self.take(2, field)?))
    }
}

/// Decode a payload section (no header)
pub fn deserialize_payload(payload: &[u8]) -> CodecResult<TemplateStore> {
    let mut reader = PayloadReader::new(payload);
    let mut records = Vec::new();

    while reader.remaining() > 0 {
        let name_len = reader.read_u8("name_len")? as usize;
        let name_offset = reader.offset;
        let name_bytes = reader.take(name_len, "name")?;
        let name = std::str::from_utf8(name_bytes)
            .map_err(|_| CodecError::InvalidName {
                offset: name_offset,
            })?
            .to_string();

        let sample_count = reader.read_u8("sample_count")? as usize;
        let mut samples = Vec::with_capacity(sample_count);
        for _ in 0..sample_count {
            let vec_len = reader.read_u16("vec_len")? as usize;
            let values = reader
                .take(vec_len, "embedding")?
                .iter()
                .map(|b| *b as i8)
                .collect();
            samples.push(Embedding::new(values)?);
        }

        records.push(IdentityRecord::with_samples(name, samples)?);
    }

    Ok(TemplateStore::from_records(records)?)
}

/// Decode header + payload
///
/// Bytes after `header.total_len()` are ignored, so a whole flash region can
/// be passed in.
pub fn deserialize(bytes: &[u8]) -> CodecResult<TemplateStore> {
    let header = Header::parse(bytes)?;
    let payload = &bytes[HEADER_LEN..];
    header.verify_payload(payload)?;
    deserialize_payload(&payload[..header.payload_len as usize])
}

/// Boot-time decode
///
/// Empty input, erased flash and any decode failure all yield an empty
/// store; the reason is logged.
pub fn decode_or_empty(bytes: &[u8]) -> TemplateStore {
    match inspect_header(bytes) {
        HeaderStatus::Erased => {
            info!("[CODEC] Flash region is erased, starting with an empty store");
            return TemplateStore::new();
        }
        HeaderStatus::Invalid(err) => {
            warn!(
                "[CODEC] No readable template store ({} bytes read): {}",
                bytes.len(),
                err
            );
            return TemplateStore::new();
        }
        HeaderStatus::Valid(_) => {}
    }

    match deserialize(bytes) {
        Ok(store) => {
            info!(
                "[CODEC] Loaded {} identities ({} samples)",
                store.len(),
                store.total_samples()
            );
            store
        }
        Err(err) => {
            warn!("[CODEC] Discarding stored templates: {}", err);
            TemplateStore::new()
        }
    }
}

//endregion
