// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Observability configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text or json)
    pub format: LogFormat,

    /// Output destination
    pub output: LogOutput,

    /// Base directory for run folders (if output is file); `./logs` when unset
    pub file_path: Option<PathBuf>,

    /// Most recent run folders kept on disk
    pub retention_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            format: LogFormat::Text,
            output: LogOutput::Stdout,
            file_path: None,
            retention_runs: 10,
        }
    }
}

impl LoggingConfig {
    /// Stdout logging from plain level and format strings, as found in a
    /// settings file.
    pub fn from_level_format(level: &str, format: &str) -> Result<Self, LogConfigError> {
        Ok(LoggingConfig {
            level: level.to_ascii_lowercase(),
            format: format.parse()?,
            ..Default::default()
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = LogConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(LogConfigError::UnknownFormat(other.to_string())),
        }
    }
}

/// Log output destination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    File,
}

#[derive(Debug, thiserror::Error)]
pub enum LogConfigError {
    #[error("Unknown log format '{0}' (expected text or json)")]
    UnknownFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_level_format() {
        let cfg = LoggingConfig::from_level_format("DEBUG", "Json").unwrap();
        assert_eq!(cfg.level, "debug");
        assert_eq!(cfg.format, LogFormat::Json);
        assert_eq!(cfg.output, LogOutput::Stdout);
        assert!(LoggingConfig::from_level_format("info", "xml").is_err());
    }

    #[test]
    fn test_serde_lowercase_variants() {
        let json = serde_json::to_value(LoggingConfig::default()).unwrap();
        assert_eq!(json["format"], "text");
        assert_eq!(json["output"], "stdout");
        let cfg: LoggingConfig =
            serde_json::from_str(r#"{"output": "file", "file_path": "/tmp/dl"}"#).unwrap();
        assert_eq!(cfg.output, LogOutput::File);
        assert_eq!(cfg.level, "info");
    }
}
