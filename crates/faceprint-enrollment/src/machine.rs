// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Enrollment state machine
//!
//! ```text
//! Idle --(name pending + subject detected)--> Capturing(name, 0)
//! Capturing(name, n) --(detection, sample captured)--> Capturing(name, n + 1)
//! Capturing(name, N) --> Consolidating(name) --> Persisting(name) --> Idle
//! Capturing(name, n) --(sample rejected by the store)--> Idle
//! ```
//!
//! One call to [`EnrollmentMachine::step`] performs at most one transition.

use faceprint_templates::{SampleOutcome, SharedTemplateStore, MAX_SAMPLES_PER_IDENTITY};
use tracing::{debug, error, info, warn};

use crate::collaborators::{CaptureSource, FeatureExtractor};
use crate::error::{CollaboratorError, EnrollmentError, EnrollmentResult};
use crate::persistence::TemplatePersistence;
use crate::state::{EnrollmentProgress, EnrollmentState, StepOutcome};

/// Session parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrollmentSettings {
    /// Samples collected before consolidation (1..=K)
    pub samples_per_enrollment: usize,
    /// Minimum time between two samples of a session
    pub sample_interval_ms: u64,
}

impl Default for EnrollmentSettings {
    fn default() -> Self {
        Self {
            samples_per_enrollment: MAX_SAMPLES_PER_IDENTITY,
            sample_interval_ms: 1000,
        }
    }
}

/// Drives one enrollment session at a time
#[derive(Debug, Clone, Default)]
pub struct EnrollmentMachine {
    settings: EnrollmentSettings,
    state: EnrollmentState,
    pending_name: Option<String>,
    last_sample_ms: Option<u64>,
}

impl EnrollmentMachine {
    /// Create an idle machine
    ///
    /// `samples_per_enrollment` is clamped to `1..=K`.
    pub fn new(settings: EnrollmentSettings) -> Self {
        let samples_per_enrollment = settings
            .samples_per_enrollment
            .clamp(1, MAX_SAMPLES_PER_IDENTITY);
        Self {
            settings: EnrollmentSettings {
                samples_per_enrollment,
                ..settings
            },
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &EnrollmentSettings {
        &self.settings
    }

    pub fn state(&self) -> &EnrollmentState {
        &self.state
    }

    /// Name waiting for a detection to start its session
    pub fn pending_name(&self) -> Option<&str> {
        self.pending_name.as_deref()
    }

    /// Progress of the active session
    pub fn enrollment_progress(&self) -> Option<EnrollmentProgress> {
        let required = self.settings.samples_per_enrollment;
        match &self.state {
            EnrollmentState::Idle => None,
            EnrollmentState::Capturing { name, count } => Some(EnrollmentProgress {
                name: name.clone(),
                collected: *count,
                required,
            }),
            EnrollmentState::Consolidating { name } | EnrollmentState::Persisting { name } => {
                Some(EnrollmentProgress {
                    name: name.clone(),
                    collected: required,
                    required,
                })
            }
        }
    }

    /// Ask for `name` to be enrolled
    ///
    /// An empty name is no request. Re-requesting the pending or active
    /// name is accepted without effect.
    ///
    /// # Errors
    /// `Busy` when a different identity is pending or being enrolled;
    /// `Template` for a name that cannot be stored
    pub fn request_enrollment(&mut self, name: &str) -> EnrollmentResult<()> {
        if name.is_empty() {
            return Ok(());
        }
        faceprint_templates::validate_name(name)?;

        let current = self.state.active_name().or(self.pending_name.as_deref());
        match current {
            Some(active) if active == name => {
                debug!("[ENROLL] '{}' already requested", name);
                Ok(())
            }
            Some(active) => {
                warn!(
                    "[ENROLL] Rejecting '{}': enrollment of '{}' in progress",
                    name, active
                );
                Err(EnrollmentError::Busy {
                    active: active.to_string(),
                    requested: name.to_string(),
                })
            }
            None => {
                info!("[ENROLL] Enrollment requested for '{}'", name);
                self.pending_name = Some(name.to_string());
                Ok(())
            }
        }
    }

    /// Drop the active session (samples already stored are kept)
    ///
    /// # Returns
    /// The abandoned or pending name
    pub fn abandon(&mut self) -> Option<String> {
        let state = std::mem::take(&mut self.state);
        self.last_sample_ms = None;
        let name = match state {
            EnrollmentState::Idle => self.pending_name.take(),
            EnrollmentState::Capturing { name, .. }
            | EnrollmentState::Consolidating { name }
            | EnrollmentState::Persisting { name } => Some(name),
        };
        self.pending_name = None;
        if let Some(name) = &name {
            info!("[ENROLL] Abandoned enrollment of '{}'", name);
        }
        name
    }

    /// Perform one transition
    ///
    /// # Arguments
    /// * `now_ms` - Current time, used for the inter-sample delay
    pub fn step<C, E, P>(
        &mut self,
        capture: &mut C,
        extractor: &mut E,
        store: &SharedTemplateStore,
        persistence: &mut P,
        now_ms: u64,
    ) -> StepOutcome
    where
        C: CaptureSource,
        E: FeatureExtractor<Frame = C::Frame>,
        P: TemplatePersistence,
    {
        match std::mem::take(&mut self.state) {
            EnrollmentState::Idle => self.step_idle(capture),
            EnrollmentState::Capturing { name, count } => {
                self.step_capturing(name, count, capture, extractor, store, now_ms)
            }
            EnrollmentState::Consolidating { name } => {
                let template = store.consolidate(&name);
                info!("[ENROLL] '{}' consolidated to {}", name, template);
                self.state = EnrollmentState::Persisting { name: name.clone() };
                StepOutcome::Consolidated { name, template }
            }
            EnrollmentState::Persisting { name } => {
                self.last_sample_ms = None;
                let snapshot = store.snapshot();
                match persistence.persist(&snapshot) {
                    Ok(report) => {
                        info!(
                            "[ENROLL] '{}' enrolled ({} bytes persisted)",
                            name, report.bytes_written
                        );
                        StepOutcome::Persisted { name, report }
                    }
                    Err(error) => {
                        error!("[ENROLL] Persisting '{}' failed: {}", name, error);
                        StepOutcome::PersistFailed { name, error }
                    }
                }
            }
        }
    }

    fn step_idle<C: CaptureSource>(&mut self, capture: &mut C) -> StepOutcome {
        let Some(name) = self.pending_name.clone() else {
            return StepOutcome::Idle;
        };

        match capture.poll_detection() {
            Ok(Some(_)) => {
                info!("[ENROLL] Subject detected, starting enrollment of '{}'", name);
                self.pending_name = None;
                self.last_sample_ms = None;
                self.state = EnrollmentState::Capturing {
                    name: name.clone(),
                    count: 0,
                };
                StepOutcome::Started { name }
            }
            Ok(None) => StepOutcome::NoSubject,
            Err(e) => {
                warn!("[ENROLL] Capture failed while waiting for '{}': {}", name, e);
                StepOutcome::CaptureFailed(CollaboratorError::Capture(e.to_string()))
            }
        }
    }

    fn step_capturing<C, E>(
        &mut self,
        name: String,
        count: usize,
        capture: &mut C,
        extractor: &mut E,
        store: &SharedTemplateStore,
        now_ms: u64,
    ) -> StepOutcome
    where
        C: CaptureSource,
        E: FeatureExtractor<Frame = C::Frame>,
    {
        if let Some(last) = self.last_sample_ms {
            let elapsed = now_ms.saturating_sub(last);
            if elapsed < self.settings.sample_interval_ms {
                self.state = EnrollmentState::Capturing { name, count };
                return StepOutcome::WaitingForInterval {
                    remaining_ms: self.settings.sample_interval_ms - elapsed,
                };
            }
        }

        let frame = match capture.poll_detection() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                self.state = EnrollmentState::Capturing { name, count };
                return StepOutcome::NoSubject;
            }
            Err(e) => {
                warn!("[ENROLL] Capture failed for '{}': {}", name, e);
                self.state = EnrollmentState::Capturing { name, count };
                return StepOutcome::CaptureFailed(CollaboratorError::Capture(e.to_string()));
            }
        };

        let embedding = match extractor.embed(&frame) {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!("[ENROLL] Feature extraction failed for '{}': {}", name, e);
                self.state = EnrollmentState::Capturing { name, count };
                return StepOutcome::CaptureFailed(CollaboratorError::Extractor(e.to_string()));
            }
        };

        let stored = match store.add_sample(&name, embedding) {
            Ok(SampleOutcome::Added { .. }) => true,
            Ok(SampleOutcome::CapacityReached) => false,
            Err(error) => {
                // The store would reject every further sample of this shape
                error!(
                    "[ENROLL] Sample {} for '{}' rejected, abandoning session: {}",
                    count + 1,
                    name,
                    error
                );
                self.last_sample_ms = None;
                return StepOutcome::SessionAborted { name, error };
            }
        };

        let count = count + 1;
        self.last_sample_ms = Some(now_ms);
        info!(
            "[ENROLL] Sample {}/{} captured for '{}'",
            count, self.settings.samples_per_enrollment, name
        );

        self.state = if count >= self.settings.samples_per_enrollment {
            EnrollmentState::Consolidating { name: name.clone() }
        } else {
            EnrollmentState::Capturing {
                name: name.clone(),
                count,
            }
        };
        StepOutcome::SampleCaptured {
            name,
            count,
            stored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{PrecomputedEmbeddings, ScriptedCapture};
    use crate::error::PersistError;
    use crate::persistence::PersistReport;
    use faceprint_templates::{Embedding, TemplateError, TemplateStore};

    /// Records every persisted store; optionally fails
    #[derive(Default)]
    struct RecordingPersistence {
        persisted: Vec<TemplateStore>,
        fail: bool,
    }

    impl TemplatePersistence for RecordingPersistence {
        fn persist(&mut self, store: &TemplateStore) -> Result<PersistReport, PersistError> {
            if self.fail {
                return Err(PersistError::RegionOverflow {
                    required: 1,
                    available: 0,
                });
            }
            self.persisted.push(store.clone());
            Ok(PersistReport {
                bytes_written: 0,
                chunks: 0,
                verified: false,
            })
        }

        fn load(&mut self) -> Result<TemplateStore, PersistError> {
            Ok(self.persisted.last().cloned().unwrap_or_default())
        }
    }

    fn emb(values: &[i8]) -> Embedding {
        Embedding::from_slice(values).unwrap()
    }

    fn no_delay() -> EnrollmentMachine {
        EnrollmentMachine::new(EnrollmentSettings {
            samples_per_enrollment: 5,
            sample_interval_ms: 0,
        })
    }

    #[test]
    fn test_full_session() {
        let mut machine = no_delay();
        let store = SharedTemplateStore::default();
        let mut persistence = RecordingPersistence::default();
        let mut capture: ScriptedCapture<Embedding> = std::iter::once(emb(&[0, 0, 0, 0]))
            .chain((1..=5i8).map(|i| emb(&[i, i + 1, i + 2, i + 3])))
            .collect();
        let mut extractor = PrecomputedEmbeddings;

        machine.request_enrollment("Alice").unwrap();
        let mut outcomes = Vec::new();
        for now in 0..8 {
            outcomes.push(machine.step(&mut capture, &mut extractor, &store, &mut persistence, now));
        }

        assert_eq!(
            outcomes[0],
            StepOutcome::Started {
                name: "Alice".to_string()
            }
        );
        assert!(matches!(
            outcomes[5],
            StepOutcome::SampleCaptured { count: 5, stored: true, .. }
        ));
        assert_eq!(
            outcomes[6],
            StepOutcome::Consolidated {
                name: "Alice".to_string(),
                template: emb(&[3, 4, 5, 6])
            }
        );
        assert!(outcomes[7].is_session_end());
        assert!(machine.state().is_idle());
        assert_eq!(persistence.persisted.len(), 1);
        assert_eq!(
            persistence.persisted[0].get_by_name("Alice").unwrap().samples(),
            &[emb(&[3, 4, 5, 6])]
        );
    }

    #[test]
    fn test_idle_without_request_never_polls() {
        let mut machine = no_delay();
        let mut capture = ScriptedCapture::new();
        capture.detect(emb(&[1]));
        let outcome = machine.step(
            &mut capture,
            &mut PrecomputedEmbeddings,
            &SharedTemplateStore::default(),
            &mut RecordingPersistence::default(),
            0,
        );
        assert_eq!(outcome, StepOutcome::Idle);
        assert_eq!(capture.remaining(), 1);
    }

    #[test]
    fn test_waits_for_detection() {
        let mut machine = no_delay();
        machine.request_enrollment("Alice").unwrap();
        let mut capture = ScriptedCapture::<Embedding>::new();
        capture.nothing();
        let outcome = machine.step(
            &mut capture,
            &mut PrecomputedEmbeddings,
            &SharedTemplateStore::default(),
            &mut RecordingPersistence::default(),
            0,
        );
        assert_eq!(outcome, StepOutcome::NoSubject);
        assert!(machine.state().is_idle());
        assert_eq!(machine.pending_name(), Some("Alice"));
    }

    #[test]
    fn test_rejected_sample_abandons_session() {
        let mut machine = no_delay();
        let store = SharedTemplateStore::new(TemplateStore::with_dimension(4));
        let mut persistence = RecordingPersistence::default();
        let mut capture: ScriptedCapture<Embedding> =
            vec![emb(&[0]), emb(&[1, 2, 3]), emb(&[1, 2, 3])].into_iter().collect();
        machine.request_enrollment("Alice").unwrap();

        let mut step = |machine: &mut EnrollmentMachine| {
            machine.step(&mut capture, &mut PrecomputedEmbeddings, &store, &mut persistence, 0)
        };
        assert!(matches!(step(&mut machine), StepOutcome::Started { .. }));
        let outcome = step(&mut machine);
        assert_eq!(
            outcome,
            StepOutcome::SessionAborted {
                name: "Alice".to_string(),
                error: TemplateError::DimensionMismatch {
                    expected: 4,
                    actual: 3
                },
            }
        );
        assert!(outcome.is_session_end());
        assert!(machine.state().is_idle());
        assert!(persistence.persisted.is_empty());

        // The machine accepts a new request right away
        assert!(machine.request_enrollment("Bob").is_ok());
        assert_eq!(capture.remaining(), 1);
    }

    #[test]
    fn test_busy_rejects_other_name() {
        let mut machine = no_delay();
        machine.request_enrollment("Alice").unwrap();
        assert!(machine.request_enrollment("Alice").is_ok());
        assert!(machine.request_enrollment("").is_ok());
        assert_eq!(
            machine.request_enrollment("Bob"),
            Err(EnrollmentError::Busy {
                active: "Alice".to_string(),
                requested: "Bob".to_string()
            })
        );
        assert_eq!(machine.abandon().as_deref(), Some("Alice"));
        assert!(machine.request_enrollment("Bob").is_ok());
    }

    #[test]
    fn test_interval_enforced() {
        let mut machine = EnrollmentMachine::new(EnrollmentSettings {
            samples_per_enrollment: 2,
            sample_interval_ms: 1000,
        });
        let store = SharedTemplateStore::default();
        let mut persistence = RecordingPersistence::default();
        let mut capture: ScriptedCapture<Embedding> =
            vec![emb(&[0]), emb(&[1]), emb(&[2])].into_iter().collect();
        let mut extractor = PrecomputedEmbeddings;
        machine.request_enrollment("Alice").unwrap();

        let mut step = |machine: &mut EnrollmentMachine, now| {
            machine.step(&mut capture, &mut extractor, &store, &mut persistence, now)
        };
        assert!(matches!(step(&mut machine, 0), StepOutcome::Started { .. }));
        assert!(matches!(step(&mut machine, 10), StepOutcome::SampleCaptured { count: 1, .. }));
        assert_eq!(
            step(&mut machine, 500),
            StepOutcome::WaitingForInterval { remaining_ms: 510 }
        );
        assert!(matches!(step(&mut machine, 1010), StepOutcome::SampleCaptured { count: 2, .. }));
        assert!(matches!(machine.state(), EnrollmentState::Consolidating { .. }));
    }

    #[test]
    fn test_extractor_failure_skips_cycle() {
        let mut machine = no_delay();
        let store = SharedTemplateStore::default();
        let mut persistence = RecordingPersistence::default();
        let mut capture: ScriptedCapture<u8> = vec![0, 1].into_iter().collect();
        let mut extractor =
            crate::collaborators::FnExtractor::new(|_: &u8| Err("model not loaded".to_string()));
        machine.request_enrollment("Alice").unwrap();
        machine.step(&mut capture, &mut extractor, &store, &mut persistence, 0);

        let outcome = machine.step(&mut capture, &mut extractor, &store, &mut persistence, 1);
        assert_eq!(
            outcome,
            StepOutcome::CaptureFailed(CollaboratorError::Extractor("model not loaded".to_string()))
        );
        assert_eq!(
            machine.state(),
            &EnrollmentState::Capturing {
                name: "Alice".to_string(),
                count: 0
            }
        );
    }

    #[test]
    fn test_persist_failure_returns_to_idle() {
        let mut machine = EnrollmentMachine::new(EnrollmentSettings {
            samples_per_enrollment: 1,
            sample_interval_ms: 0,
        });
        let store = SharedTemplateStore::default();
        let mut persistence = RecordingPersistence {
            fail: true,
            ..Default::default()
        };
        let mut capture: ScriptedCapture<Embedding> =
            vec![emb(&[1]), emb(&[1])].into_iter().collect();
        machine.request_enrollment("Alice").unwrap();

        let outcomes: Vec<StepOutcome> = (0..4)
            .map(|now| {
                machine.step(
                    &mut capture,
                    &mut PrecomputedEmbeddings,
                    &store,
                    &mut persistence,
                    now,
                )
            })
            .collect();
        assert!(matches!(outcomes[3], StepOutcome::PersistFailed { .. }));
        assert!(machine.state().is_idle());
        assert_eq!(machine.pending_name(), None);
        // The consolidated template stays in memory
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_progress() {
        let mut machine = no_delay();
        assert_eq!(machine.enrollment_progress(), None);
        machine.request_enrollment("Alice").unwrap();
        let mut capture: ScriptedCapture<Embedding> =
            vec![emb(&[1]), emb(&[1])].into_iter().collect();
        let store = SharedTemplateStore::default();
        let mut persistence = RecordingPersistence::default();
        for now in 0..2 {
            machine.step(&mut capture, &mut PrecomputedEmbeddings, &store, &mut persistence, now);
        }
        assert_eq!(
            machine.enrollment_progress(),
            Some(EnrollmentProgress {
                name: "Alice".to_string(),
                collected: 1,
                required: 5
            })
        );
    }

    #[test]
    fn test_samples_per_enrollment_clamped() {
        let machine = EnrollmentMachine::new(EnrollmentSettings {
            samples_per_enrollment: 50,
            sample_interval_ms: 0,
        });
        assert_eq!(machine.settings().samples_per_enrollment, MAX_SAMPLES_PER_IDENTITY);
    }
}
