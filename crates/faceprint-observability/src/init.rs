// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Console logging initialisation

use anyhow::{Context, Result};
use faceprint_config::{LogFormat, LoggingConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

/// Debug flags from the configuration merged with `flags`
pub fn effective_debug_flags(config: &LoggingConfig, flags: &CrateDebugFlags) -> CrateDebugFlags {
    let mut merged = flags.clone();
    for crate_name in &config.debug_crates {
        merged.enable(crate_name);
    }
    merged
}

/// Install the global console subscriber
///
/// # Arguments
/// * `config` - Default level, output format and configured debug crates
/// * `debug_flags` - Flags from the command line / `FACEPRINT_DEBUG`
///
/// # Errors
/// Invalid filter directives, or a global subscriber is already installed
pub fn init_logging(config: &LoggingConfig, debug_flags: &CrateDebugFlags) -> Result<()> {
    let flags = effective_debug_flags(config, debug_flags);
    let filter = flags.to_filter_string(&config.level);
    let env_filter = EnvFilter::try_new(&filter)
        .with_context(|| format!("Invalid log filter '{}'", filter))?;

    let console_layer = match config.format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .with_filter(env_filter)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_filter(env_filter)
            .boxed(),
    };

    Registry::default()
        .with(console_layer)
        .try_init()
        .context("Failed to install global tracing subscriber")?;

    tracing::debug!("[LOG] Logging initialised with filter '{}'", filter);
    Ok(())
}

/// Initialize logging with default settings
pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<()> {
    init_logging(&LoggingConfig::default(), debug_flags)
}
