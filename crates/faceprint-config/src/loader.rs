// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later ones winning:
//! 1. TOML file (base values)
//! 2. Environment variables (deployment overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, FaceprintConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration file name searched for
pub const CONFIG_FILE_NAME: &str = "faceprint_configuration.toml";

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "FACEPRINT_CONFIG_PATH";

/// Find the configuration file
///
/// Search order:
/// 1. `FACEPRINT_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(path) = search_paths.iter().find(|p| p.exists()) {
        return Ok(path.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet {} to specify a custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_ENV
    )))
}

/// Load configuration from a TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, the file is searched for.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if the file is not found or contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<FaceprintConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    load_config_from_str(&content, cli_args)
}

/// Parse configuration text and apply overrides
pub fn load_config_from_str(
    content: &str,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<FaceprintConfig> {
    let mut config: FaceprintConfig = toml::from_str(content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

/// Parse a decimal or `0x`-prefixed hexadecimal address
fn parse_address(value: &str) -> Option<u32> {
    let value = value.trim().replace('_', "");
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

/// Apply one named override; unknown keys and unparsable values are ignored
fn apply_override(config: &mut FaceprintConfig, key: &str, value: &str) {
    match key {
        "flash_base_address" => {
            if let Some(address) = parse_address(value) {
                config.flash.base_address = address;
            }
        }
        "flash_region_size" => {
            if let Some(size) = parse_address(value) {
                config.flash.region_size = size;
            }
        }
        "flash_chunk_size" => {
            if let Ok(size) = value.parse() {
                config.flash.chunk_size = size;
            }
        }
        "flash_word_width" => {
            if let Ok(width) = value.parse() {
                config.flash.word_width = width;
            }
        }
        "verify_after_persist" => config.flash.verify_after_persist = parse_flag(value),
        "samples_per_enrollment" => {
            if let Ok(samples) = value.parse() {
                config.enrollment.samples_per_enrollment = samples;
            }
        }
        "sample_interval_ms" => {
            if let Ok(interval) = value.parse() {
                config.enrollment.sample_interval_ms = interval;
            }
        }
        "embedding_dimension" => {
            if let Ok(dimension) = value.parse() {
                config.enrollment.embedding_dimension = dimension;
            }
        }
        "match_max_distance" => {
            if let Ok(distance) = value.parse() {
                config.matching.max_distance = Some(distance);
            }
        }
        "log_level" => config.logging.level = value.to_string(),
        "log_format" => {
            if let Ok(format) = value.parse() {
                config.logging.format = format;
            }
        }
        _ => {}
    }
}

const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("FACEPRINT_FLASH_BASE_ADDRESS", "flash_base_address"),
    ("FACEPRINT_FLASH_REGION_SIZE", "flash_region_size"),
    ("FACEPRINT_FLASH_CHUNK_SIZE", "flash_chunk_size"),
    ("FACEPRINT_FLASH_WORD_WIDTH", "flash_word_width"),
    ("FACEPRINT_VERIFY_AFTER_PERSIST", "verify_after_persist"),
    ("FACEPRINT_SAMPLES_PER_ENROLLMENT", "samples_per_enrollment"),
    ("FACEPRINT_SAMPLE_INTERVAL_MS", "sample_interval_ms"),
    ("FACEPRINT_EMBEDDING_DIMENSION", "embedding_dimension"),
    ("FACEPRINT_MATCH_MAX_DISTANCE", "match_max_distance"),
    ("FACEPRINT_LOG_LEVEL", "log_level"),
    ("FACEPRINT_LOG_FORMAT", "log_format"),
];

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `FACEPRINT_FLASH_BASE_ADDRESS` -> `flash.base_address` (decimal or `0x` hex)
/// - `FACEPRINT_FLASH_REGION_SIZE` -> `flash.region_size`
/// - `FACEPRINT_FLASH_CHUNK_SIZE` -> `flash.chunk_size`
/// - `FACEPRINT_FLASH_WORD_WIDTH` -> `flash.word_width`
/// - `FACEPRINT_VERIFY_AFTER_PERSIST` -> `flash.verify_after_persist`
/// - `FACEPRINT_SAMPLES_PER_ENROLLMENT` -> `enrollment.samples_per_enrollment`
/// - `FACEPRINT_SAMPLE_INTERVAL_MS` -> `enrollment.sample_interval_ms`
/// - `FACEPRINT_EMBEDDING_DIMENSION` -> `enrollment.embedding_dimension`
/// - `FACEPRINT_MATCH_MAX_DISTANCE` -> `matching.max_distance`
/// - `FACEPRINT_LOG_LEVEL` -> `logging.level`
/// - `FACEPRINT_LOG_FORMAT` -> `logging.format`
pub fn apply_environment_overrides(config: &mut FaceprintConfig) {
    for (var, key) in ENV_OVERRIDES {
        if let Ok(value) = env::var(var) {
            apply_override(config, key, &value);
        }
    }
}

/// Apply CLI argument overrides to configuration
///
/// Keys are the environment variable names without the `FACEPRINT_` prefix,
/// lowercased (e.g. `{"flash_chunk_size": "64", "log_level": "debug"}`).
pub fn apply_cli_overrides(config: &mut FaceprintConfig, cli_args: &HashMap<String, String>) {
    for (_, key) in ENV_OVERRIDES {
        if let Some(value) = cli_args.get(*key) {
            apply_override(config, key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogFormat;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::set_var(CONFIG_PATH_ENV, "/nonexistent/faceprint.toml");
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[flash]").unwrap();
        writeln!(file, "chunk_size = 16").unwrap();
        writeln!(file, "[enrollment]").unwrap();
        writeln!(file, "sample_interval_ms = 250").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.flash.chunk_size, 16);
        assert_eq!(config.enrollment.sample_interval_ms, 250);
    }

    #[test]
    fn test_invalid_toml() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        assert!(matches!(
            load_config_from_str("[flash\nchunk_size = ", None),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = FaceprintConfig::default();

        env::set_var("FACEPRINT_FLASH_BASE_ADDRESS", "0x9000_0000");
        env::set_var("FACEPRINT_MATCH_MAX_DISTANCE", "125.5");
        env::set_var("FACEPRINT_LOG_FORMAT", "JSON");

        apply_environment_overrides(&mut config);

        env::remove_var("FACEPRINT_FLASH_BASE_ADDRESS");
        env::remove_var("FACEPRINT_MATCH_MAX_DISTANCE");
        env::remove_var("FACEPRINT_LOG_FORMAT");

        assert_eq!(config.flash.base_address, 0x9000_0000);
        assert_eq!(config.matching.max_distance, Some(125.5));
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_unparsable_override_ignored() {
        let mut config = FaceprintConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("flash_chunk_size".to_string(), "lots".to_string());
        cli_args.insert("unknown_key".to_string(), "1".to_string());

        apply_cli_overrides(&mut config, &cli_args);

        assert_eq!(config, FaceprintConfig::default());
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::set_var("FACEPRINT_FLASH_CHUNK_SIZE", "64");
        env::set_var("FACEPRINT_SAMPLES_PER_ENROLLMENT", "3");

        let mut cli_args = HashMap::new();
        cli_args.insert("flash_chunk_size".to_string(), "128".to_string());

        let config = load_config_from_str("[flash]\nchunk_size = 16\n", Some(&cli_args)).unwrap();

        env::remove_var("FACEPRINT_FLASH_CHUNK_SIZE");
        env::remove_var("FACEPRINT_SAMPLES_PER_ENROLLMENT");

        // CLI wins for chunk size, env wins for samples (no CLI override)
        assert_eq!(config.flash.chunk_size, 128);
        assert_eq!(config.enrollment.samples_per_enrollment, 3);
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0xC0000000"), Some(0xC000_0000));
        assert_eq!(parse_address("4096"), Some(4096));
        assert_eq!(parse_address("0xZZ"), None);
    }
}
