// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for template store operations

/// Result type alias using TemplateError
pub type TemplateResult<T> = std::result::Result<T, TemplateError>;

/// Template store errors
///
/// A full identity record is not an error: `add_sample` reports it as
/// [`SampleOutcome::CapacityReached`](crate::SampleOutcome::CapacityReached).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// Identity name is empty
    #[error("Identity name must not be empty")]
    EmptyName,

    /// Identity name does not fit the 1-byte length prefix
    #[error("Identity name is {len} bytes, maximum is {max}")]
    NameTooLong { len: usize, max: usize },

    /// Embedding without values
    #[error("Embedding must contain at least one value")]
    EmptyEmbedding,

    /// Embedding does not fit the 2-byte length prefix
    #[error("Embedding has {len} values, maximum is {max}")]
    EmbeddingTooLong { len: usize, max: usize },

    /// Embedding length differs from the store's dimension
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Bulk load of a record with more than K samples
    #[error("Identity '{name}' holds {count} samples, maximum is {max}")]
    TooManySamples {
        name: String,
        count: usize,
        max: usize,
    },

    /// Bulk load with a repeated name
    #[error("Duplicate identity '{0}'")]
    DuplicateIdentity(String),
}
