// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to a section of `deepleabra_configuration.toml`. Missing
//! sections and keys fall back to the defaults below.

use serde::{Deserialize, Serialize};

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(not(feature = "std"))]
use alloc::string::{String, ToString};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DeepLeabraConfig {
    pub time: TimeConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

/// Simulated time per cycle and cycles per quarter
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Cycles per quarter; an alpha cycle is four quarters
    pub cyc_per_qtr: usize,
    /// Seconds of simulated time per cycle
    pub time_per_cyc: f32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            cyc_per_qtr: 25,
            time_per_cyc: 0.001,
        }
    }
}

impl TimeConfig {
    /// Cycles in one full alpha cycle.
    pub fn cycles_per_alpha(&self) -> usize {
        self.cyc_per_qtr * 4
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Worker threads for the parallel phases (0 = rayon global pool)
    pub threads: usize,
    /// Alpha cycles between weight-balance updates
    pub wt_bal_interval: usize,
    /// Seed for weight initialization
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            wt_bal_interval: 10,
            seed: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    /// text or json
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config: DeepLeabraConfig = toml::from_str(
            r#"
            [time]
            cyc_per_qtr = 10

            [logging]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.time.cyc_per_qtr, 10);
        assert_eq!(config.time.time_per_cyc, 0.001);
        assert_eq!(config.time.cycles_per_alpha(), 40);
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_json_snapshot() {
        let json = serde_json::to_value(DeepLeabraConfig::default()).unwrap();
        assert_eq!(json["engine"]["wt_bal_interval"], 10);
        assert_eq!(json["time"]["cyc_per_qtr"], 25);
    }
}
