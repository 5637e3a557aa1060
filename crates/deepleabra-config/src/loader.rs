// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Values are layered in three tiers, later tiers winning:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, DeepLeabraConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "deepleabra_configuration.toml";
pub const CONFIG_PATH_ENV: &str = "DEEPLEABRA_CONFIG_PATH";

/// Find the configuration file
///
/// Search order:
/// 1. `DEEPLEABRA_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Parent directories, up to 5 levels
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

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
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
/// * `config_path` - Optional path to config file. If `None`, the file is searched for.
/// * `cli_args` - Optional CLI overrides keyed by dotted name (`time.cyc_per_qtr`)
///
/// # Errors
///
/// Returns error if the file is missing, unreadable or not valid TOML, or if
/// an override carries a value that does not parse
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<DeepLeabraConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: DeepLeabraConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config)?;
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `DEEPLEABRA_CYC_PER_QTR` -> `time.cyc_per_qtr`
/// - `DEEPLEABRA_TIME_PER_CYC` -> `time.time_per_cyc`
/// - `DEEPLEABRA_THREADS` -> `engine.threads`
/// - `DEEPLEABRA_LOG_LEVEL` -> `logging.level`
pub fn apply_environment_overrides(config: &mut DeepLeabraConfig) -> ConfigResult<()> {
    if let Ok(value) = env::var("DEEPLEABRA_CYC_PER_QTR") {
        config.time.cyc_per_qtr = parse_value("DEEPLEABRA_CYC_PER_QTR", &value)?;
    }
    if let Ok(value) = env::var("DEEPLEABRA_TIME_PER_CYC") {
        config.time.time_per_cyc = parse_value("DEEPLEABRA_TIME_PER_CYC", &value)?;
    }
    if let Ok(value) = env::var("DEEPLEABRA_THREADS") {
        config.engine.threads = parse_value("DEEPLEABRA_THREADS", &value)?;
    }
    if let Ok(value) = env::var("DEEPLEABRA_LOG_LEVEL") {
        config.logging.level = value;
    }
    Ok(())
}

/// Apply CLI argument overrides to configuration
///
/// Keys are dotted section paths, e.g. `{"engine.threads": "4"}`. Unknown
/// keys are ignored.
pub fn apply_cli_overrides(
    config: &mut DeepLeabraConfig,
    cli_args: &HashMap<String, String>,
) -> ConfigResult<()> {
    if let Some(value) = cli_args.get("time.cyc_per_qtr") {
        config.time.cyc_per_qtr = parse_value("time.cyc_per_qtr", value)?;
    }
    if let Some(value) = cli_args.get("time.time_per_cyc") {
        config.time.time_per_cyc = parse_value("time.time_per_cyc", value)?;
    }
    if let Some(value) = cli_args.get("engine.threads") {
        config.engine.threads = parse_value("engine.threads", value)?;
    }
    if let Some(value) = cli_args.get("engine.wt_bal_interval") {
        config.engine.wt_bal_interval = parse_value("engine.wt_bal_interval", value)?;
    }
    if let Some(value) = cli_args.get("engine.seed") {
        config.engine.seed = parse_value("engine.seed", value)?;
    }
    if let Some(value) = cli_args.get("logging.level") {
        config.logging.level = value.clone();
    }
    if let Some(value) = cli_args.get("logging.format") {
        config.logging.format = value.clone();
    }
    Ok(())
}

fn parse_value<T: std::str::FromStr>(name: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue(format!("{} = '{}'", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const OVERRIDE_VARS: &[&str] = &[
        "DEEPLEABRA_CYC_PER_QTR",
        "DEEPLEABRA_TIME_PER_CYC",
        "DEEPLEABRA_THREADS",
        "DEEPLEABRA_LOG_LEVEL",
    ];

    fn clear_override_vars() {
        for var in OVERRIDE_VARS {
            env::remove_var(var);
        }
    }

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
        let dir = tempdir().unwrap();
        env::set_var(CONFIG_PATH_ENV, dir.path().join("absent.toml"));
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_vars();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[time]").unwrap();
        writeln!(file, "cyc_per_qtr = 10").unwrap();
        writeln!(file, "[engine]").unwrap();
        writeln!(file, "threads = 2").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.time.cyc_per_qtr, 10);
        assert_eq!(config.time.time_per_cyc, 0.001);
        assert_eq!(config.engine.threads, 2);
        assert_eq!(config.engine.wt_bal_interval, 10);
    }

    #[test]
    fn test_load_invalid_toml() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[time]\ncyc_per_qtr = \"many\"\n").unwrap();

        assert!(matches!(
            load_config(Some(&config_path), None),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = DeepLeabraConfig::default();

        env::set_var("DEEPLEABRA_CYC_PER_QTR", "50");
        env::set_var("DEEPLEABRA_THREADS", "3");
        env::set_var("DEEPLEABRA_LOG_LEVEL", "debug");
        let result = apply_environment_overrides(&mut config);
        clear_override_vars();

        assert!(result.is_ok());
        assert_eq!(config.time.cyc_per_qtr, 50);
        assert_eq!(config.engine.threads, 3);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_environment_override_bad_number() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = DeepLeabraConfig::default();

        env::set_var("DEEPLEABRA_TIME_PER_CYC", "fast");
        let result = apply_environment_overrides(&mut config);
        clear_override_vars();

        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = DeepLeabraConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("engine.wt_bal_interval".to_string(), "5".to_string());
        cli_args.insert("time.time_per_cyc".to_string(), "0.002".to_string());
        cli_args.insert("unknown.key".to_string(), "x".to_string());

        apply_cli_overrides(&mut config, &cli_args).unwrap();

        assert_eq!(config.engine.wt_bal_interval, 5);
        assert_eq!(config.time.time_per_cyc, 0.002);
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_vars();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[time]").unwrap();
        writeln!(file, "cyc_per_qtr = 20").unwrap();
        writeln!(file, "[logging]").unwrap();
        writeln!(file, "level = \"warn\"").unwrap();

        env::set_var("DEEPLEABRA_CYC_PER_QTR", "30");
        env::set_var("DEEPLEABRA_LOG_LEVEL", "error");

        let mut cli_args = HashMap::new();
        cli_args.insert("logging.level".to_string(), "trace".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args));
        clear_override_vars();
        let config = config.unwrap();

        // CLI wins for level, env wins for cycles (no CLI override)
        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.time.cyc_per_qtr, 30);
    }
}
