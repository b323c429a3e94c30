// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Identity records with a bounded sample history

use crate::embedding::Embedding;
use crate::error::{TemplateError, TemplateResult};

/// Maximum samples held by one identity (K)
pub const MAX_SAMPLES_PER_IDENTITY: usize = 5;

/// Maximum identity name length in bytes (1-byte length prefix on flash)
pub const MAX_NAME_BYTES: usize = u8::MAX as usize;

/// Check that a name can be stored and persisted
pub fn validate_name(name: &str) -> TemplateResult<()> {
    if name.is_empty() {
        return Err(TemplateError::EmptyName);
    }
    if name.len() > MAX_NAME_BYTES {
        return Err(TemplateError::NameTooLong {
            len: name.len(),
            max: MAX_NAME_BYTES,
        });
    }
    Ok(())
}

/// A named identity and its stored samples
///
/// The sample list is append-only up to [`MAX_SAMPLES_PER_IDENTITY`]; samples
/// are never evicted, only replaced wholesale by consolidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    name: String,
    samples: heapless::Vec<Embedding, MAX_SAMPLES_PER_IDENTITY>,
}

impl IdentityRecord {
    /// Create a record without samples
    pub fn new(name: impl Into<String>) -> TemplateResult<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            samples: heapless::Vec::new(),
        })
    }

    /// Create a record from an existing sample list (bulk load)
    ///
    /// # Errors
    /// `TooManySamples` when `samples` exceeds K
    pub fn with_samples(name: impl Into<String>, samples: Vec<Embedding>) -> TemplateResult<Self> {
        let mut record = Self::new(name)?;
        let count = samples.len();
        for sample in samples {
            if record.samples.push(sample).is_err() {
                return Err(TemplateError::TooManySamples {
                    name: record.name,
                    count,
                    max: MAX_SAMPLES_PER_IDENTITY,
                });
            }
        }
        Ok(record)
    }

    /// Identity name (unique key)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stored samples, oldest first
    pub fn samples(&self) -> &[Embedding] {
        &self.samples
    }

    /// Number of stored samples
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// True when no further sample can be added
    pub fn is_full(&self) -> bool {
        self.samples.is_full()
    }

    /// True when no sample is stored
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Dimension of the stored samples, if any
    pub fn dimension(&self) -> Option<usize> {
        self.samples.first().map(Embedding::len)
    }

    /// Append a sample
    ///
    /// # Returns
    /// New sample count, or the rejected sample when the record is full
    pub fn push_sample(&mut self, sample: Embedding) -> Result<usize, Embedding> {
        self.samples.push(sample)?;
        Ok(self.samples.len())
    }

    /// Replace every stored sample with a single one
    pub fn replace_samples(&mut self, sample: Embedding) {
        self.samples.clear();
        // Capacity is at least one after clear
        let _ = self.samples.push(sample);
    }
}
