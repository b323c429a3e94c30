// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Template store
//!
//! Identities are kept in insertion order, so iteration, matching and
//! serialisation are deterministic for a given store state.

use std::fmt;

use tracing::{debug, warn};

use crate::embedding::Embedding;
use crate::error::{TemplateError, TemplateResult};
use crate::identity::{validate_name, IdentityRecord, MAX_SAMPLES_PER_IDENTITY};
use crate::matching::NearestMatch;

/// Result of [`TemplateStore::add_sample`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// Sample appended; the record now holds `sample_count` samples
    Added { sample_count: usize },
    /// Record already holds K samples; the sample was dropped
    CapacityReached,
}

impl SampleOutcome {
    /// True when the sample was stored
    pub fn is_added(&self) -> bool {
        matches!(self, SampleOutcome::Added { .. })
    }
}

/// Name -> identity record mapping
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    records: Vec<IdentityRecord>,
    /// Required embedding length; `None` adopts the first stored sample's length
    dimension: Option<usize>,
}

impl TemplateStore {
    /// Create an empty store accepting any embedding length
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that only accepts `dimension`-long embeddings
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            records: Vec::new(),
            dimension: Some(dimension),
        }
    }

    /// Bulk load records (used when decoding flash contents)
    ///
    /// # Errors
    /// `DuplicateIdentity` for a repeated name, `DimensionMismatch` when the
    /// records disagree on embedding length.
    pub fn from_records(records: Vec<IdentityRecord>) -> TemplateResult<Self> {
        let mut store = Self::new();
        for record in records {
            store.insert_record(record)?;
        }
        Ok(store)
    }

    /// Append a whole record
    ///
    /// # Errors
    /// `DuplicateIdentity` if the name is already present, `DimensionMismatch`
    /// if any sample disagrees with the store's dimension.
    pub fn insert_record(&mut self, record: IdentityRecord) -> TemplateResult<()> {
        if self.contains(record.name()) {
            return Err(TemplateError::DuplicateIdentity(record.name().to_string()));
        }
        let mut expected = self.dimension();
        for sample in record.samples() {
            let expected = *expected.get_or_insert(sample.len());
            if sample.len() != expected {
                return Err(TemplateError::DimensionMismatch {
                    expected,
                    actual: sample.len(),
                });
            }
        }
        self.records.push(record);
        Ok(())
    }

    /// Dimension fixed by [`with_dimension`](Self::with_dimension) or
    /// [`pin_dimension`](Self::pin_dimension)
    pub fn pinned_dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Only accept `dimension`-long embeddings from now on
    ///
    /// # Errors
    /// `DimensionMismatch` when stored samples have another length; the store
    /// is left unchanged.
    pub fn pin_dimension(&mut self, dimension: usize) -> TemplateResult<()> {
        if let Some(actual) = self.records.iter().find_map(IdentityRecord::dimension) {
            if actual != dimension {
                return Err(TemplateError::DimensionMismatch {
                    expected: dimension,
                    actual,
                });
            }
        }
        self.dimension = Some(dimension);
        Ok(())
    }

    /// Embedding length enforced by this store, if known yet
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
            .or_else(|| self.records.iter().find_map(IdentityRecord::dimension))
    }

    /// Append a sample to `name`'s record, creating the record if absent
    ///
    /// A full record is not an error: the sample is dropped, a warning is
    /// logged and [`SampleOutcome::CapacityReached`] is returned.
    ///
    /// # Errors
    /// Invalid name, empty embedding or dimension mismatch
    pub fn add_sample(&mut self, name: &str, embedding: Embedding) -> TemplateResult<SampleOutcome> {
        validate_name(name)?;
        if embedding.is_empty() {
            return Err(TemplateError::EmptyEmbedding);
        }
        if let Some(expected) = self.dimension() {
            if embedding.len() != expected {
                return Err(TemplateError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }

        let index = match self.position(name) {
            Some(index) => index,
            None => {
                self.records.push(IdentityRecord::new(name)?);
                self.records.len() - 1
            }
        };

        match self.records[index].push_sample(embedding) {
            Ok(sample_count) => {
                debug!(
                    "[TEMPLATES] Added sample {}/{} for '{}'",
                    sample_count, MAX_SAMPLES_PER_IDENTITY, name
                );
                Ok(SampleOutcome::Added { sample_count })
            }
            Err(_) => {
                warn!(
                    "[TEMPLATES] Maximum samples ({}) reached for '{}', sample dropped",
                    MAX_SAMPLES_PER_IDENTITY, name
                );
                Ok(SampleOutcome::CapacityReached)
            }
        }
    }

    /// Replace `name`'s samples with their element-wise mean
    ///
    /// # Returns
    /// The mean, or an empty embedding when the identity is unknown or holds
    /// no samples (the store is left untouched in that case)
    pub fn consolidate(&mut self, name: &str) -> Embedding {
        let Some(record) = self.records.iter_mut().find(|r| r.name() == name) else {
            debug!("[TEMPLATES] Consolidate: unknown identity '{}'", name);
            return Embedding::empty();
        };

        match Embedding::mean(record.samples()) {
            Some(mean) => {
                debug!(
                    "[TEMPLATES] Consolidated {} samples for '{}'",
                    record.sample_count(),
                    name
                );
                record.replace_samples(mean.clone());
                mean
            }
            None => {
                debug!("[TEMPLATES] Consolidate: '{}' has no samples", name);
                Embedding::empty()
            }
        }
    }

    /// Identity owning the sample closest to `target`
    ///
    /// Every sample of every identity is compared in insertion order; ties
    /// keep the first sample encountered. Samples of a different length are
    /// skipped.
    pub fn find_nearest(&self, target: &Embedding) -> NearestMatch {
        let mut best: Option<(&str, u64)> = None;

        for record in &self.records {
            for sample in record.samples() {
                let Some(distance) = sample.squared_distance(target) else {
                    warn!(
                        "[TEMPLATES] Skipping sample of '{}': dimension {} != query {}",
                        record.name(),
                        sample.len(),
                        target.len()
                    );
                    continue;
                };
                if best.map_or(true, |(_, current)| distance < current) {
                    best = Some((record.name(), distance));
                }
            }
        }

        match best {
            Some((name, distance)) => NearestMatch {
                name: Some(name.to_string()),
                distance: distance as f64,
            },
            None => NearestMatch::none(),
        }
    }

    /// Record for `name`
    pub fn get_by_name(&self, name: &str) -> Option<&IdentityRecord> {
        self.records.iter().find(|r| r.name() == name)
    }

    /// True when `name` is enrolled
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Remove and return `name`'s record
    pub fn remove(&mut self, name: &str) -> Option<IdentityRecord> {
        let index = self.position(name)?;
        Some(self.records.remove(index))
    }

    /// Remove every identity
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Number of identities
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, IdentityRecord> {
        self.records.iter()
    }

    /// Identity names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(IdentityRecord::name)
    }

    /// Samples held across all identities
    pub fn total_samples(&self) -> usize {
        self.records.iter().map(IdentityRecord::sample_count).sum()
    }

    pub fn into_records(self) -> Vec<IdentityRecord> {
        self.records
    }

    /// Multi-line listing of every identity and its samples
    pub fn describe(&self) -> String {
        self.to_string()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.records.iter().position(|r| r.name() == name)
    }
}

/// Stores are equal when they hold the same records in the same order
impl PartialEq for TemplateStore {
    fn eq(&self, other: &Self) -> bool {
        self.records == other.records
    }
}

impl Eq for TemplateStore {}

impl<'a> IntoIterator for &'a TemplateStore {
    type Item = &'a IdentityRecord;
    type IntoIter = std::slice::Iter<'a, IdentityRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for TemplateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.records.is_empty() {
            return writeln!(f, "(no identities enrolled)");
        }
        for record in &self.records {
            writeln!(f, "Name: {}", record.name())?;
            for (idx, sample) in record.samples().iter().enumerate() {
                writeln!(f, "  Embedding {}: {}", idx + 1, sample)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emb(values: &[i8]) -> Embedding {
        Embedding::from_slice(values).unwrap()
    }

    #[test]
    fn test_add_sample_creates_record() {
        let mut store = TemplateStore::new();
        assert_eq!(
            store.add_sample("Alice", emb(&[1, 2])),
            Ok(SampleOutcome::Added { sample_count: 1 })
        );
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_by_name("Alice").unwrap().sample_count(), 1);
    }

    #[test]
    fn test_capacity_is_never_exceeded() {
        let mut store = TemplateStore::new();
        for i in 0..MAX_SAMPLES_PER_IDENTITY + 3 {
            let outcome = store.add_sample("Alice", emb(&[i as i8])).unwrap();
            if i < MAX_SAMPLES_PER_IDENTITY {
                assert!(outcome.is_added());
            } else {
                assert_eq!(outcome, SampleOutcome::CapacityReached);
            }
            assert!(store.get_by_name("Alice").unwrap().sample_count() <= MAX_SAMPLES_PER_IDENTITY);
        }
        assert_eq!(store.total_samples(), MAX_SAMPLES_PER_IDENTITY);
    }

    #[test]
    fn test_invalid_input_rejected() {
        let mut store = TemplateStore::with_dimension(2);
        assert_eq!(store.add_sample("", emb(&[1, 2])), Err(TemplateError::EmptyName));
        assert_eq!(
            store.add_sample("Alice", Embedding::empty()),
            Err(TemplateError::EmptyEmbedding)
        );
        assert_eq!(
            store.add_sample("Alice", emb(&[1, 2, 3])),
            Err(TemplateError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_dimension_adopted_from_first_sample() {
        let mut store = TemplateStore::new();
        assert_eq!(store.dimension(), None);
        store.add_sample("Alice", emb(&[1, 2, 3])).unwrap();
        assert_eq!(store.dimension(), Some(3));
        assert!(matches!(
            store.add_sample("Bob", emb(&[1])),
            Err(TemplateError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_consolidate_alice() {
        let mut store = TemplateStore::new();
        for i in 1..=5i8 {
            store.add_sample("Alice", emb(&[i, i + 1, i + 2, i + 3])).unwrap();
        }
        assert_eq!(store.consolidate("Alice"), emb(&[3, 4, 5, 6]));
        assert_eq!(store.get_by_name("Alice").unwrap().samples(), &[emb(&[3, 4, 5, 6])]);
    }

    #[test]
    fn test_consolidate_unknown_is_noop() {
        let mut store = TemplateStore::new();
        store.add_sample("Alice", emb(&[1])).unwrap();
        let before = store.clone();
        assert!(store.consolidate("Bob").is_empty());
        assert_eq!(store, before);
    }

    #[test]
    fn test_consolidate_empty_record_is_noop() {
        let mut store =
            TemplateStore::from_records(vec![IdentityRecord::new("Ghost").unwrap()]).unwrap();
        assert!(store.consolidate("Ghost").is_empty());
        assert!(store.get_by_name("Ghost").unwrap().is_empty());
    }

    #[test]
    fn test_find_nearest_empty_store() {
        let store = TemplateStore::new();
        let nearest = store.find_nearest(&emb(&[1, 2]));
        assert_eq!(nearest.name, None);
        assert!(nearest.distance.is_infinite());
    }

    #[test]
    fn test_find_nearest_exact_match() {
        let mut store = TemplateStore::new();
        store.add_sample("Alice", emb(&[7, -7])).unwrap();
        let nearest = store.find_nearest(&emb(&[7, -7]));
        assert_eq!(nearest.name.as_deref(), Some("Alice"));
        assert_eq!(nearest.distance, 0.0);
    }

    #[test]
    fn test_find_nearest_tie_keeps_first() {
        let mut store = TemplateStore::new();
        store.add_sample("Alice", emb(&[1, 0])).unwrap();
        store.add_sample("Bob", emb(&[-1, 0])).unwrap();
        let nearest = store.find_nearest(&emb(&[0, 0]));
        assert_eq!(nearest.name.as_deref(), Some("Alice"));
        assert_eq!(nearest.distance, 1.0);
    }

    #[test]
    fn test_find_nearest_scans_every_sample() {
        let mut store = TemplateStore::new();
        store.add_sample("Alice", emb(&[100, 100])).unwrap();
        store.add_sample("Bob", emb(&[50, 50])).unwrap();
        store.add_sample("Bob", emb(&[2, 2])).unwrap();
        let nearest = store.find_nearest(&emb(&[0, 0]));
        assert_eq!(nearest.name.as_deref(), Some("Bob"));
        assert_eq!(nearest.distance, 8.0);
    }

    #[test]
    fn test_find_nearest_skips_other_dimensions() {
        let mut store = TemplateStore::new();
        store.add_sample("Alice", emb(&[1, 2])).unwrap();
        assert!(!store.find_nearest(&emb(&[1, 2, 3])).is_match());
    }

    #[test]
    fn test_from_records_rejects_duplicates() {
        let records = vec![
            IdentityRecord::new("Alice").unwrap(),
            IdentityRecord::new("Alice").unwrap(),
        ];
        assert_eq!(
            TemplateStore::from_records(records),
            Err(TemplateError::DuplicateIdentity("Alice".to_string()))
        );
    }

    #[test]
    fn test_from_records_rejects_mixed_dimensions() {
        let records = vec![
            IdentityRecord::with_samples("Alice", vec![emb(&[1, 2])]).unwrap(),
            IdentityRecord::with_samples("Bob", vec![emb(&[1, 2, 3])]).unwrap(),
        ];
        assert_eq!(
            TemplateStore::from_records(records),
            Err(TemplateError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn test_remove_and_order() {
        let mut store = TemplateStore::new();
        for name in ["Carol", "Alice", "Bob"] {
            store.add_sample(name, emb(&[0])).unwrap();
        }
        assert_eq!(store.names().collect::<Vec<_>>(), ["Carol", "Alice", "Bob"]);
        assert!(store.remove("Alice").is_some());
        assert!(store.remove("Alice").is_none());
        assert_eq!(store.names().collect::<Vec<_>>(), ["Carol", "Bob"]);
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut store = TemplateStore::new();
        store.add_sample("alice", emb(&[0])).unwrap();
        store.add_sample("Alice", emb(&[0])).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_describe() {
        let mut store = TemplateStore::new();
        assert_eq!(store.describe(), "(no identities enrolled)\n");
        store.add_sample("Alice", emb(&[3, 4])).unwrap();
        store.add_sample("Alice", emb(&[-1, 0])).unwrap();
        assert_eq!(
            store.describe(),
            "Name: Alice\n  Embedding 1: [3, 4]\n  Embedding 2: [-1, 0]\n"
        );
    }

    #[test]
    fn test_pin_dimension() {
        let mut store = TemplateStore::new();
        store.add_sample("Alice", emb(&[1, 2, 3])).unwrap();
        assert_eq!(store.pinned_dimension(), None);
        assert_eq!(
            store.pin_dimension(4),
            Err(TemplateError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(store.pinned_dimension(), None);

        store.pin_dimension(3).unwrap();
        store.remove("Alice");
        assert_eq!(store.dimension(), Some(3));
        assert!(store.add_sample("Bob", emb(&[1, 2])).is_err());
    }
}
