// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Every violation is collected before reporting, so one run of
//! [`validate_config`] lists all problems in the file.

use crate::{ConfigError, ConfigResult, DeepLeabraConfig};
use core::fmt;

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(not(feature = "std"))]
use alloc::{format, string::String, string::ToString, vec::Vec};

pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
pub const LOG_FORMATS: &[&str] = &["text", "json"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every violation found
pub fn validate_config(config: &DeepLeabraConfig) -> ConfigResult<()> {
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

/// All violations in `config`, in section order.
pub fn collect_errors(config: &DeepLeabraConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_time(config, &mut errors);
    validate_engine(config, &mut errors);
    validate_logging(config, &mut errors);
    errors
}

fn validate_time(config: &DeepLeabraConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.time.cyc_per_qtr == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "time.cyc_per_qtr".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let dt = config.time.time_per_cyc;
    if !dt.is_finite() || dt <= 0.0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "time.time_per_cyc".to_string(),
            reason: format!("must be a positive number, got {}", dt),
        });
    }
}

fn validate_engine(config: &DeepLeabraConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.engine.wt_bal_interval == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "engine.wt_bal_interval".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
}

fn validate_logging(config: &DeepLeabraConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = config.logging.level.to_ascii_lowercase();
    if level.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "logging.level".to_string(),
        });
    } else if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!("unknown level '{}' (expected one of {:?})", config.logging.level, LOG_LEVELS),
        });
    }

    let format = config.logging.format.to_ascii_lowercase();
    if !LOG_FORMATS.contains(&format.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.format".to_string(),
            reason: format!("unknown format '{}' (expected text or json)", config.logging.format),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes() {
        assert!(collect_errors(&DeepLeabraConfig::default()).is_empty());
    }

    #[test]
    fn test_all_violations_reported_together() {
        let mut config = DeepLeabraConfig::default();
        config.time.cyc_per_qtr = 0;
        config.time.time_per_cyc = -0.5;
        config.logging.level = "loud".to_string();
        config.logging.format = "xml".to_string();

        assert_eq!(collect_errors(&config).len(), 4);
        match validate_config(&config) {
            Err(ConfigError::ValidationError(msg)) => {
                assert!(msg.contains("time.cyc_per_qtr"));
                assert!(msg.contains("time.time_per_cyc"));
                assert!(msg.contains("logging.level"));
                assert!(msg.contains("logging.format"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_nan_time_step_rejected() {
        let mut config = DeepLeabraConfig::default();
        config.time.time_per_cyc = f32::NAN;
        assert_eq!(collect_errors(&config).len(), 1);
    }

    #[test]
    fn test_level_case_insensitive_and_empty() {
        let mut config = DeepLeabraConfig::default();
        config.logging.level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());
        config.logging.level = String::new();
        assert_eq!(
            collect_errors(&config),
            vec![ConfigValidationError::MissingRequired {
                field: "logging.level".to_string()
            }]
        );
    }
}
