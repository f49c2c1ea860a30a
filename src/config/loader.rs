//! Configuration loading and discovery for `tileblend.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::TileblendConfig;
use log::debug;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name searched for by [`find_config`].
pub const CONFIG_FILE: &str = "tileblend.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse tileblend.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override the asset root
    pub root: Option<PathBuf>,
    /// Override the blend seed
    pub seed: Option<u64>,
    /// Override the number of loader threads
    pub jobs: Option<usize>,
}

/// Find tileblend.toml by walking up from the current working directory.
pub fn find_config() -> Option<PathBuf> {
    let cwd = env::current_dir().ok()?;
    find_config_from(cwd)
}

/// Find tileblend.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a tileblend.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses
/// [`find_config`] to locate one. If no config file is found, returns
/// [`default_config`].
///
/// A relative `assets.root` is resolved against the directory holding the
/// config file.
pub fn load_config(path: Option<&Path>) -> Result<TileblendConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => {
            debug!("no {} found, using defaults", CONFIG_FILE);
            Ok(default_config())
        }
    }
}

fn load_config_file(path: &Path) -> Result<TileblendConfig, ConfigError> {
    debug!("loading config from {}", path.display());
    let contents = fs::read_to_string(path)?;
    let mut config: TileblendConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    if let Some(dir) = project_root(path) {
        config.assets.root = resolve_path(dir, &config.assets.root);
    }
    Ok(config)
}

/// Configuration used when no tileblend.toml exists: images under
/// `./images`, 32x32 retained floors.
pub fn default_config() -> TileblendConfig {
    TileblendConfig::default()
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut TileblendConfig, overrides: &CliOverrides) {
    if let Some(ref root) = overrides.root {
        config.assets.root = root.clone();
    }

    if let Some(seed) = overrides.seed {
        config.blend.seed = Some(seed);
    }

    if let Some(jobs) = overrides.jobs {
        config.assets.jobs = Some(jobs);
    }
}

/// Get the project root directory from a config file path.
pub fn project_root(config_path: &Path) -> Option<&Path> {
    config_path.parent()
}

/// Resolve a path relative to the project root.
///
/// If the path is absolute, returns it unchanged.
pub fn resolve_path(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}
