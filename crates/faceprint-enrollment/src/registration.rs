// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Registration loop: the enrollment machine wired to its collaborators

use faceprint_hal::TimeProvider;
use faceprint_templates::SharedTemplateStore;
use tracing::{info, warn};

use crate::collaborators::{CaptureSource, FeatureExtractor, NameSource};
use crate::error::{CollaboratorError, PersistResult};
use crate::machine::EnrollmentMachine;
use crate::persistence::TemplatePersistence;
use crate::recognition::{MatchOutcome, Recognizer};
use crate::state::StepOutcome;

/// One synchronous enrollment/recognition loop
///
/// Each [`run_cycle`](Self::run_cycle) drains the name source, forwards any
/// request to the machine and steps it. Consolidation and persistence need
/// no capture input, so they complete within the cycle that collected the
/// last sample.
pub struct RegistrationLoop<N, C, E, P, T>
where
    N: NameSource,
    C: CaptureSource,
    E: FeatureExtractor<Frame = C::Frame>,
    P: TemplatePersistence,
    T: TimeProvider,
{
    names: N,
    capture: C,
    extractor: E,
    persistence: P,
    clock: T,
    store: SharedTemplateStore,
    machine: EnrollmentMachine,
    recognizer: Recognizer,
}

impl<N, C, E, P, T> RegistrationLoop<N, C, E, P, T>
where
    N: NameSource,
    C: CaptureSource,
    E: FeatureExtractor<Frame = C::Frame>,
    P: TemplatePersistence,
    T: TimeProvider,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        machine: EnrollmentMachine,
        recognizer: Recognizer,
        names: N,
        capture: C,
        extractor: E,
        persistence: P,
        clock: T,
        store: SharedTemplateStore,
    ) -> Self {
        Self {
            names,
            capture,
            extractor,
            persistence,
            clock,
            store,
            machine,
            recognizer,
        }
    }

    /// Replace the in-memory store with the persisted one
    ///
    /// A dimension pinned on the current store stays in force.
    ///
    /// # Returns
    /// Number of identities loaded
    pub fn boot(&mut self) -> PersistResult<usize> {
        let loaded = self.persistence.load()?;
        let count = self.store.restore(loaded);
        info!(
            "[REGISTER] Boot: {} identities loaded\n{}",
            count,
            self.store.snapshot().describe()
        );
        Ok(count)
    }

    /// One loop iteration
    ///
    /// # Returns
    /// The outcome of every machine step taken
    pub fn run_cycle(&mut self) -> Vec<StepOutcome> {
        while let Some(name) = self.names.take_name() {
            if let Err(e) = self.machine.request_enrollment(&name) {
                warn!("[REGISTER] {}", e);
            }
        }

        let mut outcomes = Vec::new();
        loop {
            let outcome = self.machine.step(
                &mut self.capture,
                &mut self.extractor,
                &self.store,
                &mut self.persistence,
                self.clock.get_time_ms(),
            );
            if let StepOutcome::Persisted { .. } = outcome {
                info!("[REGISTER] Stored templates:\n{}", self.store.snapshot().describe());
            }
            outcomes.push(outcome);
            if !self.machine.state().is_automatic() {
                break;
            }
        }
        outcomes
    }

    /// Match the next detected face
    pub fn recognize(&mut self) -> Result<Option<MatchOutcome>, CollaboratorError> {
        self.recognizer
            .recognize_frame(&mut self.capture, &mut self.extractor, &self.store)
    }

    pub fn machine(&self) -> &EnrollmentMachine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut EnrollmentMachine {
        &mut self.machine
    }

    pub fn store(&self) -> &SharedTemplateStore {
        &self.store
    }

    pub fn names_mut(&mut self) -> &mut N {
        &mut self.names
    }

    pub fn capture_mut(&mut self) -> &mut C {
        &mut self.capture
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut P {
        &mut self.persistence
    }

    pub fn clock(&self) -> &T {
        &self.clock
    }
}
