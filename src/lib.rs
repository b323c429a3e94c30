// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Faceprint - face template enrollment on raw NOR flash
//!
//! Faceprint enrolls face embeddings under a name, consolidates the captured
//! samples into a single template, matches query embeddings against the
//! enrolled templates and persists the whole store to a raw NOR/OSPI flash
//! region so it survives a reset.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! faceprint = "0.0.1-beta.18"
//! ```
//!
//! ## Crates
//!
//! - **`faceprint-hal`**: `NorFlash` trait, busy-poll `FlashAdapter`, simulated flash, clocks
//! - **`faceprint-templates`**: template store, consolidation, nearest-neighbour matching
//! - **`faceprint-serialization`**: persisted byte format and chunk planning
//! - **`faceprint-enrollment`**: enrollment state machine, flash persistence, recognition
//! - **`faceprint-config`**: `faceprint_configuration.toml` loader
//! - **`faceprint-observability`**: logging initialisation and debug flags
//!
//! ## Usage
//!
//! ```rust
//! use faceprint::prelude::*;
//!
//! let config = FaceprintConfig::default();
//! let mut system = FaceprintSystem::simulated(&config, ManualClock::new()).unwrap();
//!
//! // Blank flash restores an empty store
//! assert_eq!(system.boot().unwrap(), 0);
//!
//! let face = Embedding::new(vec![3, 4, 5, 6]).unwrap();
//! system.store().add_sample("Alice", face.clone()).unwrap();
//! system.persist().unwrap();
//!
//! let outcome = system.recognize(&face);
//! assert_eq!(outcome.name(), Some("Alice"));
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use faceprint_config as config;
pub use faceprint_enrollment as enrollment;
pub use faceprint_hal as hal;
pub use faceprint_observability as observability;
pub use faceprint_serialization as serialization;
pub use faceprint_templates as templates;

use faceprint_config::{
    validate_config, ConfigError, EnrollmentConfig, FaceprintConfig, FlashConfig,
    MatchingConfig,
};
use faceprint_enrollment::{
    CaptureSource, EnrollmentMachine, EnrollmentSettings, FeatureExtractor, FlashLayout,
    FlashPersistence, MatchOutcome, NameSource, PersistError, PersistReport, Recognizer,
    RegistrationLoop, TemplatePersistence,
};
use faceprint_hal::{
    FlashAdapter, FlashAdapterConfig, NorFlash, SimulatedNorFlash, TimeProvider, WordWidth,
};
use faceprint_templates::{Embedding, SharedTemplateStore, TemplateStore};
use tracing::info;

/// Errors raised while assembling or running a [`FaceprintSystem`]
#[derive(Debug, thiserror::Error)]
pub enum FaceprintError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),
}

pub type FaceprintResult<T> = Result<T, FaceprintError>;

//region Config mapping

/// Device word width from `flash.word_width` (bits)
pub fn word_width(config: &FlashConfig) -> FaceprintResult<WordWidth> {
    match config.word_width {
        8 => Ok(WordWidth::Byte),
        16 => Ok(WordWidth::HalfWord),
        other => Err(ConfigError::ValidationError(format!(
            "flash.word_width must be 8 or 16, got {}",
            other
        ))
        .into()),
    }
}

pub fn flash_layout(config: &FlashConfig) -> FlashLayout {
    FlashLayout {
        base_address: config.base_address,
        region_size: config.region_size,
        chunk_size: config.chunk_size,
    }
}

pub fn adapter_config(config: &FlashConfig) -> FlashAdapterConfig {
    FlashAdapterConfig {
        program_timeout_us: config.program_timeout_us,
        erase_timeout_us: config.erase_timeout_us,
        poll_interval_us: config.poll_interval_us,
    }
}

pub fn enrollment_settings(config: &EnrollmentConfig) -> EnrollmentSettings {
    EnrollmentSettings {
        samples_per_enrollment: config.samples_per_enrollment,
        sample_interval_ms: config.sample_interval_ms,
    }
}

pub fn recognizer(config: &MatchingConfig) -> Recognizer {
    match config.max_distance {
        Some(max_distance) => Recognizer::with_max_distance(max_distance),
        None => Recognizer::new(),
    }
}

/// Empty store, pinned to `enrollment.embedding_dimension` when non-zero
pub fn template_store(config: &EnrollmentConfig) -> SharedTemplateStore {
    let store = match config.embedding_dimension {
        0 => TemplateStore::new(),
        dimension => TemplateStore::with_dimension(dimension),
    };
    SharedTemplateStore::new(store)
}

/// Simulated device covering `flash.device_capacity` bytes from the region base
pub fn simulated_device(config: &FlashConfig) -> FaceprintResult<SimulatedNorFlash> {
    Ok(SimulatedNorFlash::new(
        config.base_address,
        config.device_capacity,
        word_width(config)?,
    ))
}

/// Flash persistence for `device` configured from `flash`
pub fn build_persistence<D, T>(
    config: &FlashConfig,
    device: D,
    clock: T,
) -> FaceprintResult<FlashPersistence<D, T>>
where
    D: NorFlash,
    T: TimeProvider,
{
    let adapter = FlashAdapter::new(device, clock, adapter_config(config));
    let persistence = FlashPersistence::new(adapter, flash_layout(config))?
        .with_verification(config.verify_after_persist);
    Ok(persistence)
}

/// Registration loop with every component built from `config`
///
/// `clock` drives both the flash busy-poll timeout and the sample interval.
pub fn build_registration_loop<N, C, E, D, T>(
    config: &FaceprintConfig,
    device: D,
    clock: T,
    names: N,
    capture: C,
    extractor: E,
) -> FaceprintResult<RegistrationLoop<N, C, E, FlashPersistence<D, T>, T>>
where
    N: NameSource,
    C: CaptureSource,
    E: FeatureExtractor<Frame = C::Frame>,
    D: NorFlash,
    T: TimeProvider + Clone,
{
    validate_config(config)?;
    let persistence = build_persistence(&config.flash, device, clock.clone())?;
    Ok(RegistrationLoop::new(
        EnrollmentMachine::new(enrollment_settings(&config.enrollment)),
        recognizer(&config.matching),
        names,
        capture,
        extractor,
        persistence,
        clock,
        template_store(&config.enrollment),
    ))
}

//endregion

/// Template store, matcher and flash persistence behind one handle
///
/// For applications that drive enrollment themselves; use
/// [`build_registration_loop`] for the full capture-driven loop.
pub struct FaceprintSystem<D: NorFlash, T: TimeProvider> {
    store: SharedTemplateStore,
    recognizer: Recognizer,
    persistence: FlashPersistence<D, T>,
}

impl<T: TimeProvider> FaceprintSystem<SimulatedNorFlash, T> {
    /// System backed by an in-memory flash device
    pub fn simulated(config: &FaceprintConfig, clock: T) -> FaceprintResult<Self> {
        Self::new(config, simulated_device(&config.flash)?, clock)
    }
}

impl<D: NorFlash, T: TimeProvider> FaceprintSystem<D, T> {
    /// Validate `config` and assemble the system around `device`
    pub fn new(config: &FaceprintConfig, device: D, clock: T) -> FaceprintResult<Self> {
        validate_config(config)?;
        let persistence = build_persistence(&config.flash, device, clock)?;
        info!(
            "[FACEPRINT] Template region 0x{:08X}..0x{:08X} ({} chunks of {} bytes max)",
            config.flash.base_address,
            persistence.layout().end_address(),
            config.flash.region_size as usize / config.flash.chunk_size.max(1),
            config.flash.chunk_size
        );
        Ok(Self {
            store: template_store(&config.enrollment),
            recognizer: recognizer(&config.matching),
            persistence,
        })
    }

    /// Restore the store from flash
    ///
    /// `enrollment.embedding_dimension` stays in force; templates of another
    /// dimension are discarded.
    ///
    /// # Returns
    /// Number of identities loaded (0 for blank or corrupt flash)
    pub fn boot(&mut self) -> FaceprintResult<usize> {
        let loaded = self.persistence.load()?;
        Ok(self.store.restore(loaded))
    }

    /// Write the current store to flash
    pub fn persist(&mut self) -> FaceprintResult<PersistReport> {
        let snapshot = self.store.snapshot();
        Ok(self.persistence.persist(&snapshot)?)
    }

    /// Match a query embedding against the current store
    pub fn recognize(&self, embedding: &Embedding) -> MatchOutcome {
        self.store
            .with_lock(|store| self.recognizer.recognize(store, embedding))
    }

    pub fn store(&self) -> &SharedTemplateStore {
        &self.store
    }

    pub fn recognizer(&self) -> &Recognizer {
        &self.recognizer
    }

    pub fn persistence(&self) -> &FlashPersistence<D, T> {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut FlashPersistence<D, T> {
        &mut self.persistence
    }
}

/// Prelude module for convenient imports
///
/// ```rust
/// use faceprint::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{build_registration_loop, FaceprintError, FaceprintResult, FaceprintSystem};
    pub use faceprint_config::{load_config, FaceprintConfig};
    pub use faceprint_enrollment::{
        EnrollmentMachine, EnrollmentSettings, EnrollmentState, FlashLayout, FlashPersistence,
        MatchOutcome, PrecomputedEmbeddings, QueuedNames, Recognizer, RegistrationLoop,
        ScriptedCapture, StepOutcome, TemplatePersistence,
    };
    pub use faceprint_hal::{
        FlashAdapter, FlashAdapterConfig, ManualClock, NorFlash, SimulatedNorFlash, TimeProvider,
        WordWidth,
    };
    pub use faceprint_templates::{Embedding, NearestMatch, SharedTemplateStore, TemplateStore};
}
