// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Enrollment states and step results

use std::fmt;

use faceprint_templates::{Embedding, TemplateError};

use crate::error::{CollaboratorError, PersistError};
use crate::persistence::PersistReport;

/// Enrollment session state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EnrollmentState {
    /// No session
    #[default]
    Idle,
    /// Collecting samples for `name`
    Capturing { name: String, count: usize },
    /// All samples collected, mean not yet computed
    Consolidating { name: String },
    /// Store about to be written to flash
    Persisting { name: String },
}

impl EnrollmentState {
    pub fn is_idle(&self) -> bool {
        matches!(self, EnrollmentState::Idle)
    }

    /// Identity of the active session
    pub fn active_name(&self) -> Option<&str> {
        match self {
            EnrollmentState::Idle => None,
            EnrollmentState::Capturing { name, .. }
            | EnrollmentState::Consolidating { name }
            | EnrollmentState::Persisting { name } => Some(name),
        }
    }

    /// True when the next step needs no capture input
    pub fn is_automatic(&self) -> bool {
        matches!(
            self,
            EnrollmentState::Consolidating { .. } | EnrollmentState::Persisting { .. }
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentState::Idle => "idle",
            EnrollmentState::Capturing { .. } => "capturing",
            EnrollmentState::Consolidating { .. } => "consolidating",
            EnrollmentState::Persisting { .. } => "persisting",
        }
    }
}

impl fmt::Display for EnrollmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrollmentState::Idle => write!(f, "idle"),
            EnrollmentState::Capturing { name, count } => {
                write!(f, "capturing '{}' ({} samples)", name, count)
            }
            EnrollmentState::Consolidating { name } => write!(f, "consolidating '{}'", name),
            EnrollmentState::Persisting { name } => write!(f, "persisting '{}'", name),
        }
    }
}

/// Progress of the active session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentProgress {
    pub name: String,
    pub collected: usize,
    pub required: usize,
}

/// What one machine step did
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Nothing pending
    Idle,
    /// A name is pending but no subject was detected
    NoSubject,
    /// Session started for `name`
    Started { name: String },
    /// Too soon after the previous sample; nothing polled
    WaitingForInterval { remaining_ms: u64 },
    /// Sample `count` of the session captured (`stored` is false when the
    /// record was already full)
    SampleCaptured {
        name: String,
        count: usize,
        stored: bool,
    },
    /// Capture or extraction failed; cycle skipped
    CaptureFailed(CollaboratorError),
    /// Embedding rejected by the store; session abandoned
    ///
    /// Samples already stored for `name` are kept.
    SessionAborted { name: String, error: TemplateError },
    /// Samples replaced by their mean
    Consolidated { name: String, template: Embedding },
    /// Store written to flash; session finished
    Persisted { name: String, report: PersistReport },
    /// Store could not be written; session finished anyway
    PersistFailed { name: String, error: PersistError },
}

impl StepOutcome {
    /// True when this step ended a session
    pub fn is_session_end(&self) -> bool {
        matches!(
            self,
            StepOutcome::Persisted { .. }
                | StepOutcome::PersistFailed { .. }
                | StepOutcome::SessionAborted { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_name() {
        assert_eq!(EnrollmentState::Idle.active_name(), None);
        let state = EnrollmentState::Capturing {
            name: "Alice".to_string(),
            count: 2,
        };
        assert_eq!(state.active_name(), Some("Alice"));
        assert!(!state.is_automatic());
        assert_eq!(state.to_string(), "capturing 'Alice' (2 samples)");
    }

    #[test]
    fn test_aborted_session_ends() {
        let outcome = StepOutcome::SessionAborted {
            name: "Alice".to_string(),
            error: TemplateError::EmptyEmbedding,
        };
        assert!(outcome.is_session_end());
        assert!(!StepOutcome::NoSubject.is_session_end());
    }
}
