// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-crate debug selection from the command line and `DEEPLEABRA_DEBUG`.
//!
//! `--debug-deepleabra-npu-engine` raises one crate to debug level while the
//! rest stay at the configured level; `--debug-all` raises every crate in
//! [`KNOWN_CRATES`].

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

/// Environment variable holding `all` or a comma-separated crate list
pub const DEBUG_ENV: &str = "DEEPLEABRA_DEBUG";

const FLAG_PREFIX: &str = "--debug-";

/// One debug request, from a flag or an env list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DebugTarget {
    All,
    Crate(String),
}

impl DebugTarget {
    fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "" => None,
            "all" => Some(Self::All),
            name => Some(Self::Crate(name.to_string())),
        }
    }

    fn from_flag(arg: &str) -> Option<Self> {
        arg.strip_prefix(FLAG_PREFIX).and_then(Self::from_name)
    }
}

/// Crates selected for debug logging.
///
/// ```rust
/// use deepleabra_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-deepleabra-npu-engine".to_string()]);
/// assert!(flags.is_enabled("deepleabra-npu-engine"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrateDebugFlags {
    pub enabled_crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Collect `--debug-*` flags; every other argument is ignored.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = Self::default();
        args.into_iter()
            .filter_map(|arg| DebugTarget::from_flag(&arg))
            .for_each(|target| flags.select(target));
        flags
    }

    /// Add crates from a `DEEPLEABRA_DEBUG`-style value.
    pub fn merge_env_value(&mut self, value: &str) {
        value
            .split(',')
            .filter_map(DebugTarget::from_name)
            .for_each(|target| self.select(target));
    }

    fn select(&mut self, target: DebugTarget) {
        match target {
            DebugTarget::All => self
                .enabled_crates
                .extend(KNOWN_CRATES.iter().map(|c| c.to_string())),
            DebugTarget::Crate(name) => {
                self.enabled_crates.insert(name);
            }
        }
    }

    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// Selected names that are not crates of this workspace, usually typos.
    pub fn unknown_crates(&self) -> Vec<&str> {
        self.enabled_crates
            .iter()
            .map(String::as_str)
            .filter(|name| !KNOWN_CRATES.contains(name))
            .collect()
    }

    /// `EnvFilter` directive with `info` as the default level.
    pub fn to_filter_string(&self) -> String {
        self.to_filter_string_with_default("info")
    }

    /// `EnvFilter` directive: `deepleabra_npu_engine=debug,...,{default_level}`.
    pub fn to_filter_string_with_default(&self, default_level: &str) -> String {
        self.enabled_crates
            .iter()
            .map(|name| format!("{}=debug", tracing_target(name)))
            .chain(std::iter::once(default_level.to_string()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Tracing target of a crate: its library name.
fn tracing_target(crate_name: &str) -> String {
    crate_name.replace('-', "_")
}

/// Debug flags from the process arguments plus `DEEPLEABRA_DEBUG`.
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    if let Ok(value) = env::var(DEBUG_ENV) {
        flags.merge_env_value(&value);
    }
    flags
}

/// Usage text for the debug flags, one line per workspace crate.
pub fn debug_flags_help() -> String {
    let width = KNOWN_CRATES.iter().map(|c| c.len()).max().unwrap_or(0) + FLAG_PREFIX.len();
    let mut help = String::from("Per-crate debug logging:\n");
    help.push_str(&format!("  {:<width$}  every crate below\n", "--debug-all"));
    for name in KNOWN_CRATES {
        let flag = format!("{FLAG_PREFIX}{name}");
        help.push_str(&format!("  {:<width$}  target {}\n", flag, tracing_target(name)));
    }
    help.push_str(&format!(
        "\n{DEBUG_ENV}=all or a comma-separated crate list does the same, \
         e.g. {DEBUG_ENV}=deepleabra-npu-engine,deepleabra-npu-plasticity\n"
    ));
    help
}
