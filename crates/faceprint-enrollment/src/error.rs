// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for enrollment, persistence and collaborators

use faceprint_hal::FlashError;
use faceprint_serialization::CodecError;
use faceprint_templates::TemplateError;

/// Enrollment request errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnrollmentError {
    /// A different identity is already being enrolled
    #[error("Enrollment of '{active}' in progress, '{requested}' rejected")]
    Busy { active: String, requested: String },

    /// Requested name cannot be stored
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Flash persistence errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistError {
    /// Device command failed or timed out
    #[error("Flash error: {0}")]
    Flash(#[from] FlashError),

    /// Store could not be encoded, or the write plan is invalid
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Encoded store does not fit the region; nothing was erased
    #[error("Encoded store needs {required} bytes, region holds {available}")]
    RegionOverflow { required: usize, available: usize },

    /// Read-back differs from what was written
    #[error("Read-back mismatch at image offset {offset}")]
    VerifyMismatch { offset: usize },

    /// Layout rejected before touching the device
    #[error("Invalid flash layout: {0}")]
    InvalidLayout(String),
}

/// Capture or feature extraction failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("Feature extraction failed: {0}")]
    Extractor(String),
}

pub type EnrollmentResult<T> = std::result::Result<T, EnrollmentError>;
pub type PersistResult<T> = std::result::Result<T, PersistError>;
