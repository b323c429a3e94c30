// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Face embedding vectors

use std::fmt;

use crate::error::{TemplateError, TemplateResult};

/// Fixed-length signed 8-bit feature vector
///
/// Produced by the external feature extractor (int8-quantised model output)
/// and never modified after capture. The length is model-defined; the only
/// hard limit is the 2-byte length prefix of the persisted format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Embedding {
    values: Vec<i8>,
}

impl Embedding {
    /// Largest representable dimension
    pub const MAX_DIMENSION: usize = u16::MAX as usize;

    /// Wrap a captured vector
    ///
    /// # Errors
    /// `EmptyEmbedding` for an empty vector, `EmbeddingTooLong` above
    /// [`Embedding::MAX_DIMENSION`] values.
    pub fn new(values: Vec<i8>) -> TemplateResult<Self> {
        if values.is_empty() {
            return Err(TemplateError::EmptyEmbedding);
        }
        if values.len() > Self::MAX_DIMENSION {
            return Err(TemplateError::EmbeddingTooLong {
                len: values.len(),
                max: Self::MAX_DIMENSION,
            });
        }
        Ok(Self { values })
    }

    /// Copy a captured slice
    pub fn from_slice(values: &[i8]) -> TemplateResult<Self> {
        Self::new(values.to_vec())
    }

    /// The empty vector returned by a failed consolidation
    pub fn empty() -> Self {
        Self { values: Vec::new() }
    }

    /// Raw values
    pub fn as_slice(&self) -> &[i8] {
        &self.values
    }

    /// Number of values (the dimension)
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for the empty vector
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Take ownership of the raw values
    pub fn into_vec(self) -> Vec<i8> {
        self.values
    }

    /// Squared Euclidean distance (sum of squared differences)
    ///
    /// Every position is visited; there is no early termination.
    ///
    /// # Returns
    /// `None` when the dimensions differ
    pub fn squared_distance(&self, other: &Embedding) -> Option<u64> {
        if self.values.len() != other.values.len() {
            return None;
        }

        let sum = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| {
                let diff = *a as i32 - *b as i32;
                (diff * diff) as u64
            })
            .sum();
        Some(sum)
    }

    /// Element-wise arithmetic mean
    ///
    /// Each position is rounded to the nearest integer (halves away from
    /// zero) and clamped to the `i8` range.
    ///
    /// # Returns
    /// `None` for an empty slice or when the samples disagree on dimension
    pub fn mean(samples: &[Embedding]) -> Option<Embedding> {
        let first = samples.first()?;
        let dimension = first.len();
        if samples.iter().any(|s| s.len() != dimension) {
            return None;
        }

        let mut sums = vec![0i64; dimension];
        for sample in samples {
            for (sum, value) in sums.iter_mut().zip(sample.values.iter()) {
                *sum += *value as i64;
            }
        }

        let count = samples.len() as f64;
        let values = sums
            .into_iter()
            .map(|sum| (sum as f64 / count).round().clamp(i8::MIN as f64, i8::MAX as f64) as i8)
            .collect();
        Some(Embedding { values })
    }
}

impl TryFrom<Vec<i8>> for Embedding {
    type Error = TemplateError;

    fn try_from(values: Vec<i8>) -> TemplateResult<Self> {
        Embedding::new(values)
    }
}

impl AsRef<[i8]> for Embedding {
    fn as_ref(&self) -> &[i8] {
        &self.values
    }
}

impl fmt::Display for Embedding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (idx, value) in self.values.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emb(values: &[i8]) -> Embedding {
        Embedding::from_slice(values).unwrap()
    }

    #[test]
    fn test_rejects_empty_and_oversized() {
        assert_eq!(Embedding::new(vec![]), Err(TemplateError::EmptyEmbedding));
        let oversized = vec![0i8; Embedding::MAX_DIMENSION + 1];
        assert!(matches!(
            Embedding::new(oversized),
            Err(TemplateError::EmbeddingTooLong { .. })
        ));
    }

    #[test]
    fn test_squared_distance() {
        assert_eq!(emb(&[3, 4, 5, 6]).squared_distance(&emb(&[3, 4, 5, 5])), Some(1));
        assert_eq!(
            emb(&[-128, 127]).squared_distance(&emb(&[127, -128])),
            Some(2 * 255 * 255)
        );
        assert_eq!(emb(&[1, 2]).squared_distance(&emb(&[1, 2, 3])), None);
    }

    #[test]
    fn test_mean_of_sliding_window() {
        let samples: Vec<Embedding> = (1..=5i8)
            .map(|i| emb(&[i, i + 1, i + 2, i + 3]))
            .collect();
        assert_eq!(Embedding::mean(&samples), Some(emb(&[3, 4, 5, 6])));
    }

    #[test]
    fn test_mean_rounds_half_away_from_zero() {
        let samples = [emb(&[1, -1, 0]), emb(&[2, -2, 1])];
        // 1.5 -> 2, -1.5 -> -2, 0.5 -> 1
        assert_eq!(Embedding::mean(&samples), Some(emb(&[2, -2, 1])));
    }

    #[test]
    fn test_mean_of_single_sample_is_identity() {
        let sample = emb(&[-128, 0, 127]);
        assert_eq!(Embedding::mean(std::slice::from_ref(&sample)), Some(sample));
    }

    #[test]
    fn test_mean_rejects_mixed_dimensions() {
        assert_eq!(Embedding::mean(&[emb(&[1]), emb(&[1, 2])]), None);
        assert_eq!(Embedding::mean(&[]), None);
    }
}
