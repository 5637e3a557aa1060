// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Unified logging initialization
//!
//! Installs one global `tracing` subscriber. Console output is the default;
//! with the `file-logging` feature, logs can go to a timestamped run folder:
//! ```text
//! ./logs/
//!   └── run_20250101_120000/
//!       └── deepleabra.log
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, LogOutput, LoggingConfig};

const RUN_PREFIX: &str = "run_";
const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Keeps file writers alive; logs are flushed when it is dropped.
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    fn console() -> Self {
        LoggingGuard {
            #[cfg(feature = "file-logging")]
            _file_guard: None,
            log_dir: None,
        }
    }

    /// Run folder receiving the logs, if output goes to a file.
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// Filter from the configured level, raised to debug for flagged crates.
pub fn build_env_filter(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<EnvFilter> {
    let directive = debug_flags.to_filter_string_with_default(&config.level);
    EnvFilter::try_new(&directive).with_context(|| format!("Invalid log filter '{}'", directive))
}

/// Install the global subscriber described by `config`.
///
/// # Errors
/// Fails on an invalid level, when a global subscriber is already set, or when
/// the log folder cannot be created.
pub fn init_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<LoggingGuard> {
    let filter = build_env_filter(debug_flags, config)?;
    let guard = install_subscriber(filter, config)?;
    for name in debug_flags.unknown_crates() {
        tracing::warn!(crate_name = name, "debug flag names no crate of this workspace");
    }
    Ok(guard)
}

fn install_subscriber(filter: EnvFilter, config: &LoggingConfig) -> Result<LoggingGuard> {
    match config.output {
        LogOutput::Stdout => {
            let layer = match config.format {
                LogFormat::Text => tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_filter(filter)
                    .boxed(),
                LogFormat::Json => tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_filter(filter)
                    .boxed(),
            };
            Registry::default()
                .with(layer)
                .try_init()
                .context("A global tracing subscriber is already installed")?;
            Ok(LoggingGuard::console())
        }
        LogOutput::File => init_file_logging(filter, config),
    }
}

/// Console logging at `info`, honoring the debug flags.
pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    init_logging(debug_flags, &LoggingConfig::default())
}

#[cfg(feature = "file-logging")]
fn init_file_logging(filter: EnvFilter, config: &LoggingConfig) -> Result<LoggingGuard> {
    let base_log_dir = config
        .file_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("./logs"));
    let run_folder = base_log_dir.join(run_folder_name(chrono::Utc::now().naive_utc()));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;
    cleanup_old_runs(&base_log_dir, config.retention_runs)?;

    let appender = tracing_appender::rolling::never(&run_folder, "deepleabra.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = match config.format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(filter)
            .boxed(),
    };
    Registry::default()
        .with(layer)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(LoggingGuard {
        _file_guard: Some(guard),
        log_dir: Some(run_folder),
    })
}

#[cfg(not(feature = "file-logging"))]
fn init_file_logging(_filter: EnvFilter, _config: &LoggingConfig) -> Result<LoggingGuard> {
    anyhow::bail!("File log output requires the `file-logging` feature")
}

/// `run_YYYYMMDD_HHMMSS` for the given time.
pub fn run_folder_name(at: NaiveDateTime) -> String {
    format!("{}{}", RUN_PREFIX, at.format(RUN_TIMESTAMP_FORMAT))
}

/// Delete all but the `keep` most recent run folders under `base_log_dir`.
///
/// Entries whose names do not parse as run folders are left alone.
pub fn cleanup_old_runs(base_log_dir: &Path, keep: usize) -> Result<usize> {
    if !base_log_dir.exists() {
        return Ok(0);
    }

    let mut runs: Vec<(PathBuf, NaiveDateTime)> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let stamp = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(RUN_PREFIX))
            .and_then(|s| NaiveDateTime::parse_from_str(s, RUN_TIMESTAMP_FORMAT).ok());
        if let Some(dt) = stamp {
            runs.push((path, dt));
        }
    }

    if runs.len() <= keep {
        return Ok(0);
    }
    runs.sort_by_key(|(_, dt)| *dt);
    let to_remove = runs.len() - keep;
    let mut removed = 0;
    for (path, _) in runs.iter().take(to_remove) {
        match std::fs::remove_dir_all(path) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!(
                "Warning: Failed to remove old log directory {}: {}",
                path.display(),
                e
            ),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stamp(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_run_folder_name() {
        assert_eq!(run_folder_name(stamp(7)), "run_20250307_120000");
    }

    #[test]
    fn test_cleanup_keeps_most_recent() {
        let dir = tempfile::tempdir().unwrap();
        for day in 1..=5 {
            std::fs::create_dir(dir.path().join(run_folder_name(stamp(day)))).unwrap();
        }
        std::fs::create_dir(dir.path().join("notes")).unwrap();

        assert_eq!(cleanup_old_runs(dir.path(), 2).unwrap(), 3);
        assert!(dir.path().join(run_folder_name(stamp(5))).exists());
        assert!(dir.path().join(run_folder_name(stamp(4))).exists());
        assert!(!dir.path().join(run_folder_name(stamp(3))).exists());
        assert!(dir.path().join("notes").exists());
    }

    #[test]
    fn test_cleanup_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(cleanup_old_runs(&dir.path().join("absent"), 1).unwrap(), 0);
    }

    #[test]
    fn test_invalid_level_rejected() {
        let config = LoggingConfig {
            level: "very=loud=".to_string(),
            ..Default::default()
        };
        assert!(build_env_filter(&CrateDebugFlags::default(), &config).is_err());
    }

    #[cfg(not(feature = "file-logging"))]
    #[test]
    fn test_file_output_needs_feature() {
        let config = LoggingConfig {
            output: LogOutput::File,
            ..Default::default()
        };
        let err = init_logging(&CrateDebugFlags::default(), &config).err().unwrap();
        assert!(err.to_string().contains("file-logging"));
    }
}
