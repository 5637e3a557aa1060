// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # deepleabra-observability
//!
//! Logging setup shared by every DeepLeabra binary and test harness, with
//! per-crate debug flags.
//!
//! ## Features
//! - `file-logging`: write logs into timestamped run folders (desktop only)

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

// Re-export commonly used items
pub use cli::*;
pub use config::*;
pub use init::*;

/// Known DeepLeabra crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "deepleabra",
    "deepleabra-npu-neural",
    "deepleabra-npu-plasticity",
    "deepleabra-npu-engine",
    "deepleabra-config",
];
