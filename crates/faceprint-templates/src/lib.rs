// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Faceprint Templates
//!
//! In-memory template store for enrolled identities.
//!
//! This crate provides:
//! - **[`Embedding`]** - fixed-length `i8` feature vector produced by the external extractor
//! - **[`IdentityRecord`]** - a named identity with at most [`MAX_SAMPLES_PER_IDENTITY`] samples
//! - **[`TemplateStore`]** - insertion-ordered identities with consolidation and nearest-neighbour lookup
//! - **[`SharedTemplateStore`]** - the store behind a single lock, for callers that share it across threads
//!
//! ## Usage
//!
//! ```rust
//! use faceprint_templates::{Embedding, TemplateStore};
//!
//! let mut store = TemplateStore::new();
//! store.add_sample("Alice", Embedding::new(vec![3, 4, 5, 6]).unwrap()).unwrap();
//! store.add_sample("Bob", Embedding::new(vec![-3, -4, -5, -6]).unwrap()).unwrap();
//!
//! let nearest = store.find_nearest(&Embedding::new(vec![3, 4, 5, 5]).unwrap());
//! assert_eq!(nearest.name.as_deref(), Some("Alice"));
//! assert_eq!(nearest.distance, 1.0);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod embedding;
pub mod error;
pub mod identity;
pub mod matching;
pub mod shared;
pub mod store;

pub use embedding::Embedding;
pub use error::{TemplateError, TemplateResult};
pub use identity::{validate_name, IdentityRecord, MAX_NAME_BYTES, MAX_SAMPLES_PER_IDENTITY};
pub use matching::{NearestMatch, NO_MATCH_DISTANCE};
pub use shared::SharedTemplateStore;
pub use store::{SampleOutcome, TemplateStore};
