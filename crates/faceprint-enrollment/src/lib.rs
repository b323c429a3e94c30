// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Faceprint Enrollment
//!
//! Enrollment and recognition flows on top of the template store.
//!
//! ## Components
//!
//! - **[`EnrollmentMachine`]** - `Idle -> Capturing -> Consolidating -> Persisting -> Idle`
//! - **[`FlashPersistence`]** - writes the encoded store to a raw NOR region (erase once, sequential chunks)
//! - **[`Recognizer`]** - nearest-neighbour match with an optional distance threshold
//! - **[`RegistrationLoop`]** - one synchronous loop driving all of the above
//! - **[`collaborators`]** - traits for the camera, the feature extractor and the name input
//!
//! ## Usage
//!
//! ```rust
//! use faceprint_enrollment::{
//!     EnrollmentMachine, EnrollmentSettings, FlashLayout, FlashPersistence, PrecomputedEmbeddings,
//!     ScriptedCapture, StepOutcome,
//! };
//! use faceprint_hal::{FlashAdapter, FlashAdapterConfig, ManualClock, SimulatedNorFlash, WordWidth};
//! use faceprint_templates::{Embedding, SharedTemplateStore};
//!
//! let adapter = FlashAdapter::new(
//!     SimulatedNorFlash::new(0xC000_0000, 4096, WordWidth::Byte),
//!     ManualClock::new(),
//!     FlashAdapterConfig::default(),
//! );
//! let layout = FlashLayout { region_size: 4096, ..FlashLayout::default() };
//! let mut persistence = FlashPersistence::new(adapter, layout).unwrap();
//!
//! let mut machine = EnrollmentMachine::new(EnrollmentSettings {
//!     samples_per_enrollment: 1,
//!     sample_interval_ms: 0,
//! });
//! let store = SharedTemplateStore::default();
//! let face = Embedding::new(vec![3, 4, 5, 6]).unwrap();
//! let mut capture: ScriptedCapture<Embedding> = vec![face.clone(), face].into_iter().collect();
//!
//! machine.request_enrollment("Alice").unwrap();
//! let mut last = StepOutcome::Idle;
//! for now in 0..4 {
//!     last = machine.step(&mut capture, &mut PrecomputedEmbeddings, &store, &mut persistence, now);
//! }
//! assert!(matches!(last, StepOutcome::Persisted { .. }));
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod collaborators;
pub mod error;
pub mod machine;
pub mod persistence;
pub mod recognition;
pub mod registration;
pub mod state;

pub use collaborators::{
    CaptureSource, FeatureExtractor, FnExtractor, NameSource, PrecomputedEmbeddings, QueuedNames,
    ScriptedCapture,
};
pub use error::{
    CollaboratorError, EnrollmentError, EnrollmentResult, PersistError, PersistResult,
};
pub use machine::{EnrollmentMachine, EnrollmentSettings};
pub use persistence::{FlashLayout, FlashPersistence, PersistReport, TemplatePersistence};
pub use recognition::{MatchOutcome, Recognizer};
pub use registration::RegistrationLoop;
pub use state::{EnrollmentProgress, EnrollmentState, StepOutcome};
