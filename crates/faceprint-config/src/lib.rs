// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Faceprint Configuration System
//!
//! Type-safe configuration loader with support for:
//! - TOML file parsing (`faceprint_configuration.toml`)
//! - Environment variable overrides (`FACEPRINT_*`)
//! - CLI argument overrides
//! - Validation against the flash format and template store limits
//!
//! ## Usage
//!
//! ```rust,no_run
//! use faceprint_config::{load_config, validate_config};
//!
//! let config = load_config(None, None).expect("Failed to load config");
//! validate_config(&config).expect("Invalid config");
//!
//! println!("Flash base: 0x{:08X}", config.flash.base_address);
//! println!("Samples per enrollment: {}", config.enrollment.samples_per_enrollment);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{
    apply_cli_overrides, apply_environment_overrides, find_config_file, load_config,
    load_config_from_str, CONFIG_FILE_NAME, CONFIG_PATH_ENV,
};
pub use types::*;
pub use validation::{collect_errors, validate_config, ConfigValidationError};

/// Re-export for convenience
pub use serde;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found. Searched: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax: {0}")]
    ParseError(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FaceprintConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collect_errors_are_std_errors() {
        let mut config = FaceprintConfig::default();
        config.flash.word_width = 12;
        let errors = collect_errors(&config);
        assert_eq!(errors.len(), 1);

        let error: Box<dyn std::error::Error> = Box::new(errors[0].clone());
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for flash.word_width: 12 bits is not supported (8 or 16)"
        );
    }
}
