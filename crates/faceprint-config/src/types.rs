// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to a section of `faceprint_configuration.toml`.

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FaceprintConfig {
    pub flash: FlashConfig,
    pub enrollment: EnrollmentConfig,
    pub matching: MatchingConfig,
    pub logging: LoggingConfig,
}

/// Template region on the OSPI/NOR device
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FlashConfig {
    /// First byte of the template region
    pub base_address: u32,
    /// Template region size in bytes
    pub region_size: u32,
    /// Bytes per program burst
    pub chunk_size: usize,
    /// Device word width in bits (8 or 16)
    pub word_width: u8,
    /// Size of the simulated device window starting at `base_address`
    pub device_capacity: u32,
    pub program_timeout_us: u64,
    pub erase_timeout_us: u64,
    pub poll_interval_us: u32,
    /// Read the image back after every write
    pub verify_after_persist: bool,
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            base_address: 0xC000_0000,
            region_size: 64 * 1024,
            chunk_size: 32,
            word_width: 16,
            device_capacity: 64 * 1024,
            program_timeout_us: 100_000,
            erase_timeout_us: 120_000_000,
            poll_interval_us: 10,
            verify_after_persist: true,
        }
    }
}

/// Enrollment session parameters
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EnrollmentConfig {
    pub samples_per_enrollment: usize,
    /// Pose change delay between two samples
    pub sample_interval_ms: u64,
    /// Required embedding length, 0 = adopt the first sample's length
    pub embedding_dimension: usize,
}

impl Default for EnrollmentConfig {
    fn default() -> Self {
        Self {
            samples_per_enrollment: 5,
            sample_interval_ms: 1000,
            embedding_dimension: 0,
        }
    }
}

/// Recognition parameters
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Largest squared distance accepted as a match; unset accepts any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f64>,
}

/// Console log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level (`error`, `warn`, `info`, `debug`, `trace`)
    pub level: String,
    pub format: LogFormat,
    /// Crates logged at debug level regardless of `level`
    pub debug_crates: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            debug_crates: Vec::new(),
        }
    }
}
