// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Matching a captured face against enrolled identities

use std::fmt;

use faceprint_templates::{Embedding, SharedTemplateStore, TemplateStore, NO_MATCH_DISTANCE};
use tracing::{debug, info};

use crate::collaborators::{CaptureSource, FeatureExtractor};
use crate::error::CollaboratorError;

/// Result of a recognition attempt
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// Closest identity within the threshold
    Match { name: String, distance: f64 },
    /// Empty store, or the closest identity is too far away
    NoMatch { nearest_distance: f64 },
}

impl MatchOutcome {
    /// Matched identity name
    pub fn name(&self) -> Option<&str> {
        match self {
            MatchOutcome::Match { name, .. } => Some(name),
            MatchOutcome::NoMatch { .. } => None,
        }
    }
}

impl fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchOutcome::Match { name, distance } => {
                write!(f, "{} (distance {})", name, distance)
            }
            MatchOutcome::NoMatch { nearest_distance } if nearest_distance.is_infinite() => {
                write!(f, "unknown (no identities enrolled)")
            }
            MatchOutcome::NoMatch { nearest_distance } => {
                write!(f, "unknown (nearest distance {})", nearest_distance)
            }
        }
    }
}

/// Nearest-neighbour matcher with an optional acceptance threshold
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Recognizer {
    max_distance: Option<f64>,
}

impl Recognizer {
    /// Accept the nearest identity whatever its distance
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept only identities at squared distance `<= max_distance`
    pub fn with_max_distance(max_distance: f64) -> Self {
        Self {
            max_distance: Some(max_distance),
        }
    }

    pub fn max_distance(&self) -> Option<f64> {
        self.max_distance
    }

    /// Match `embedding` against `store`
    pub fn recognize(&self, store: &TemplateStore, embedding: &Embedding) -> MatchOutcome {
        let nearest = store.find_nearest(embedding);
        let outcome = match nearest.name {
            Some(name) if self.max_distance.map_or(true, |max| nearest.distance <= max) => {
                MatchOutcome::Match {
                    name,
                    distance: nearest.distance,
                }
            }
            Some(_) => MatchOutcome::NoMatch {
                nearest_distance: nearest.distance,
            },
            None => MatchOutcome::NoMatch {
                nearest_distance: NO_MATCH_DISTANCE,
            },
        };
        debug!("[MATCH] {}", outcome);
        outcome
    }

    /// One capture -> embed -> match cycle
    ///
    /// # Returns
    /// `None` when no subject was detected
    pub fn recognize_frame<C, E>(
        &self,
        capture: &mut C,
        extractor: &mut E,
        store: &SharedTemplateStore,
    ) -> Result<Option<MatchOutcome>, CollaboratorError>
    where
        C: CaptureSource,
        E: FeatureExtractor<Frame = C::Frame>,
    {
        let Some(frame) = capture
            .poll_detection()
            .map_err(|e| CollaboratorError::Capture(e.to_string()))?
        else {
            return Ok(None);
        };
        let embedding = extractor
            .embed(&frame)
            .map_err(|e| CollaboratorError::Extractor(e.to_string()))?;

        let outcome = store.with_lock(|store| self.recognize(store, &embedding));
        info!("[MATCH] Recognized: {}", outcome);
        Ok(Some(outcome))
    }
}
