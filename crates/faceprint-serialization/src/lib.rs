// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Faceprint Serialization
//!
//! Byte format used to persist a [`TemplateStore`](faceprint_templates::TemplateStore)
//! on raw flash, plus the chunk plan used to stream it to the device.
//!
//! ## Core Components
//!
//! - **[`serialize`] / [`deserialize`]** - strict encode and decode
//! - **[`decode_or_empty`]** - boot-time decode that treats erased or corrupt flash as an empty store
//! - **[`inspect_header`]** - classifies the first [`HEADER_LEN`] bytes read from flash
//! - **[`ChunkPlan`]** - splits an encoded store into sequential program bursts
//!
//! ## Format
//!
//! All multi-byte fields are little-endian.
//!
//! ```text
//! header:  [magic "FPRT":4][version:1][payload_len:4][crc32(payload):4]
//! payload: per identity [name_len:1][name][sample_count:1]
//!          per sample   [vec_len:2][i8 * vec_len]
//! ```
//!
//! ## Basic Usage
//!
//! ```rust
//! use faceprint_serialization::{deserialize, serialize};
//! use faceprint_templates::{Embedding, TemplateStore};
//!
//! let mut store = TemplateStore::new();
//! store.add_sample("Alice", Embedding::new(vec![3, 4, 5, 6]).unwrap()).unwrap();
//!
//! let bytes = serialize(&store).unwrap();
//! assert_eq!(deserialize(&bytes).unwrap(), store);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod chunking;
pub mod codec;
pub mod error;
pub mod format;

pub use chunking::{Chunk, ChunkPlan, Chunks};
pub use codec::{
    decode_or_empty, deserialize, deserialize_payload, encoded_len, serialize, serialize_payload,
};
pub use error::{CodecError, CodecResult};
pub use format::{inspect_header, Header, HeaderStatus, FORMAT_VERSION, HEADER_LEN, MAGIC};
