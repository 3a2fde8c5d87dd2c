//! Manifest parsing and discovery

use crate::config::types::Config;
use crate::error::{ConfigError, ConfigResult, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default manifest file names to search for
const CONFIG_FILE_NAMES: &[&str] = &["ccbuild.yml", "ccbuild.yaml"];

/// Name of the optional environment file next to the manifest
const ENV_FILE_NAME: &str = ".env";

/// Find the manifest by searching current and parent directories
pub fn find_config_file() -> ConfigResult<PathBuf> {
    find_config_file_from(env::current_dir().map_err(|e| {
        ConfigError::Invalid(format!("Failed to get current directory: {}", e))
    })?)
}

/// Find the manifest starting from a specific directory
pub fn find_config_file_from(start_dir: PathBuf) -> ConfigResult<PathBuf> {
    let mut current_dir = start_dir;
    let mut searched_paths = Vec::new();

    loop {
        for file_name in CONFIG_FILE_NAMES {
            let config_path = current_dir.join(file_name);
            searched_paths.push(config_path.display().to_string());

            if config_path.is_file() {
                return Ok(config_path);
            }
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => return Err(ConfigError::NotFound(searched_paths.join(", "))),
        }
    }
}

/// Parse a manifest file from a path
pub fn parse_config_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path).map_err(|e| {
        ConfigError::Invalid(format!("Failed to read {}: {}", path.display(), e))
    })?;

    parse_config(&contents)
}

/// Parse a manifest from a string
pub fn parse_config(yaml: &str) -> Result<Config> {
    let config: Config = serde_yaml::from_str(yaml)?;
    Ok(config)
}

/// Parse the manifest found by automatic discovery
pub fn parse_config_auto() -> Result<(Config, PathBuf)> {
    let config_path = find_config_file()?;
    let config = parse_config_file(&config_path)?;
    Ok((config, config_path))
}

/// Load `.env` from the manifest's directory, if there is one
///
/// Variables already set in the environment are kept. Returns whether a
/// file was loaded.
pub fn load_env_file(config_path: &Path) -> ConfigResult<bool> {
    let dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let env_path = dir.join(ENV_FILE_NAME);
    if !env_path.is_file() {
        return Ok(false);
    }

    dotenvy::from_path(&env_path).map_err(|e| {
        ConfigError::Invalid(format!("Failed to load {}: {}", env_path.display(), e))
    })?;
    Ok(true)
}
