// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Checks that the configured flash layout can hold the persisted format and
//! that enrollment parameters fit the template store limits.

use crate::{ConfigError, ConfigResult, FaceprintConfig};
use faceprint_hal::MAX_CHUNK_BYTES;
use faceprint_serialization::HEADER_LEN;
use faceprint_templates::MAX_SAMPLES_PER_IDENTITY;

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("{field} = {value} is outside {range}")]
    OutOfRange {
        field: String,
        value: String,
        range: String,
    },
    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every violation
pub fn validate_config(config: &FaceprintConfig) -> ConfigResult<()> {
    let errors = collect_errors(config);
    if errors.is_empty() {
        return Ok(());
    }

    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

/// Every violation found in `config`
pub fn collect_errors(config: &FaceprintConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_flash(config, &mut errors);
    validate_enrollment(config, &mut errors);
    validate_matching(config, &mut errors);
    errors
}

fn validate_flash(config: &FaceprintConfig, errors: &mut Vec<ConfigValidationError>) {
    let flash = &config.flash;

    if flash.word_width != 8 && flash.word_width != 16 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "flash.word_width".to_string(),
            reason: format!("{} bits is not supported (8 or 16)", flash.word_width),
        });
    }

    if flash.chunk_size == 0 || flash.chunk_size > MAX_CHUNK_BYTES {
        errors.push(ConfigValidationError::OutOfRange {
            field: "flash.chunk_size".to_string(),
            value: flash.chunk_size.to_string(),
            range: format!("1..={}", MAX_CHUNK_BYTES),
        });
    } else if flash.word_width == 16 && flash.chunk_size % 2 != 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "flash.chunk_size".to_string(),
            reason: "must be even on a 16-bit device".to_string(),
        });
    }

    if flash.word_width == 16 && flash.base_address % 2 != 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "flash.base_address".to_string(),
            reason: "must be 2-byte aligned on a 16-bit device".to_string(),
        });
    }

    if (flash.region_size as usize) < HEADER_LEN {
        errors.push(ConfigValidationError::InvalidValue {
            field: "flash.region_size".to_string(),
            reason: format!("must hold at least the {}-byte header", HEADER_LEN),
        });
    }

    if flash.base_address as u64 + flash.region_size as u64 > u32::MAX as u64 + 1 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "flash.region_size".to_string(),
            reason: format!(
                "0x{:08X} + {} overflows the 32-bit address space",
                flash.base_address, flash.region_size
            ),
        });
    }

    if flash.device_capacity < flash.region_size {
        errors.push(ConfigValidationError::InvalidValue {
            field: "flash.device_capacity".to_string(),
            reason: format!(
                "{} bytes cannot hold a {}-byte region",
                flash.device_capacity, flash.region_size
            ),
        });
    }
}

fn validate_enrollment(config: &FaceprintConfig, errors: &mut Vec<ConfigValidationError>) {
    let samples = config.enrollment.samples_per_enrollment;
    if samples == 0 || samples > MAX_SAMPLES_PER_IDENTITY {
        errors.push(ConfigValidationError::OutOfRange {
            field: "enrollment.samples_per_enrollment".to_string(),
            value: samples.to_string(),
            range: format!("1..={}", MAX_SAMPLES_PER_IDENTITY),
        });
    }

    if config.enrollment.embedding_dimension > u16::MAX as usize {
        errors.push(ConfigValidationError::OutOfRange {
            field: "enrollment.embedding_dimension".to_string(),
            value: config.enrollment.embedding_dimension.to_string(),
            range: format!("0..={}", u16::MAX),
        });
    }
}

fn validate_matching(config: &FaceprintConfig, errors: &mut Vec<ConfigValidationError>) {
    if let Some(distance) = config.matching.max_distance {
        if !distance.is_finite() || distance < 0.0 {
            errors.push(ConfigValidationError::InvalidValue {
                field: "matching.max_distance".to_string(),
                reason: format!("{} is not a finite non-negative distance", distance),
            });
        }
    }
}
