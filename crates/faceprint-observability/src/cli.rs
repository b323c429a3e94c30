// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-crate debug flags
//!
//! Supports flags like `--debug-faceprint-hal` or `--debug-all`, and the
//! `FACEPRINT_DEBUG` environment variable.

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

/// Environment variable listing crates to debug (comma-separated or `all`)
pub const DEBUG_ENV: &str = "FACEPRINT_DEBUG";

/// Crates with debug logging enabled
///
/// # Example
/// ```rust
/// use faceprint_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-faceprint-hal".to_string()]);
/// assert!(flags.is_enabled("faceprint-hal"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrateDebugFlags {
    enabled_crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Parse debug flags from command-line arguments
    ///
    /// Looks for arguments matching `--debug-{crate-name}`; `--debug-all`
    /// enables every known crate.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = Self::default();
        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
            } else if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enable(crate_name);
            }
        }
        flags
    }

    /// Add crates from a comma-separated list (`all` enables every known crate)
    pub fn extend_from_list(&mut self, list: &str) {
        if list.trim() == "all" {
            self.enable_all();
            return;
        }
        for crate_name in list.split(',').map(str::trim).filter(|c| !c.is_empty()) {
            self.enable(crate_name);
        }
    }

    pub fn enable(&mut self, crate_name: &str) {
        self.enabled_crates.insert(crate_name.to_string());
    }

    pub fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enable(crate_name);
        }
    }

    /// Check if debug is enabled for a specific crate
    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    /// Check if debug is enabled for any crate
    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    pub fn enabled_crates(&self) -> impl Iterator<Item = &str> {
        self.enabled_crates.iter().map(String::as_str)
    }

    /// Log level for a crate
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// `EnvFilter` directive string
    ///
    /// Crate names become tracing targets (`faceprint-hal` -> `faceprint_hal`).
    /// Format: `"warn,faceprint_hal=debug"` with `default_level` first.
    pub fn to_filter_string(&self, default_level: &str) -> String {
        let mut directives = vec![default_level.to_string()];
        directives.extend(
            self.enabled_crates
                .iter()
                .map(|c| format!("{}=debug", c.replace('-', "_"))),
        );
        directives.join(",")
    }
}

/// Debug flags from the process arguments and `FACEPRINT_DEBUG`
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    if let Ok(list) = env::var(DEBUG_ENV) {
        flags.extend_from_list(&list);
    }
    flags
}

/// Generate help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  {}={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  {}=all                               Enable debug for all crates
"#,
        KNOWN_CRATES.join(", "),
        DEBUG_ENV,
        DEBUG_ENV
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-faceprint-hal".to_string()]);
        assert!(flags.is_enabled("faceprint-hal"));
        assert!(!flags.is_enabled("faceprint-templates"));
        assert_eq!(flags.log_level("faceprint-hal"), tracing::Level::DEBUG);
        assert_eq!(flags.log_level("faceprint-templates"), tracing::Level::INFO);
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-all".to_string()]);
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_list_parsing() {
        let mut flags = CrateDebugFlags::default();
        flags.extend_from_list(" faceprint-hal, ,faceprint-enrollment ");
        assert_eq!(
            flags.enabled_crates().collect::<Vec<_>>(),
            ["faceprint-enrollment", "faceprint-hal"]
        );
    }

    #[test]
    fn test_filter_string() {
        assert_eq!(CrateDebugFlags::default().to_filter_string("info"), "info");
        let flags = CrateDebugFlags::from_args(vec!["--debug-faceprint-hal".to_string()]);
        assert_eq!(flags.to_filter_string("warn"), "warn,faceprint_hal=debug");
    }

    #[test]
    fn test_parse_debug_flags_reads_env() {
        env::set_var(DEBUG_ENV, "faceprint-config, faceprint-hal");
        let flags = parse_debug_flags();
        env::remove_var(DEBUG_ENV);
        assert!(flags.is_enabled("faceprint-config"));
        assert!(flags.is_enabled("faceprint-hal"));
        assert!(!flags.is_enabled("faceprint-enrollment"));

        assert!(!parse_debug_flags().is_enabled("faceprint-config"));
    }

    #[test]
    fn test_help_lists_flags_and_crates() {
        let help = debug_flags_help();
        assert!(help.contains("--debug-all"));
        assert!(help.contains("--debug-{crate-name}"));
        assert!(help.contains(&format!("{}=all", DEBUG_ENV)));
        for crate_name in KNOWN_CRATES {
            assert!(help.contains(crate_name), "help should list {}", crate_name);
        }
    }
}
