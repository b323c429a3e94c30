// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # faceprint-observability
//!
//! Logging initialisation for Faceprint binaries and test harnesses.
//!
//! Every crate logs through `tracing` with a bracketed subsystem tag
//! (`[FLASH]`, `[CODEC]`, `[ENROLL]`, ...). This crate installs the console
//! subscriber and resolves per-crate debug flags from `--debug-<crate>`
//! arguments, the `FACEPRINT_DEBUG` environment variable and
//! `logging.debug_crates` in the configuration file.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Known Faceprint crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "faceprint",
    "faceprint-hal",
    "faceprint-templates",
    "faceprint-serialization",
    "faceprint-enrollment",
    "faceprint-config",
];
