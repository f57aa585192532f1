//! Configuration module for itemlens
//!
//! Handles loading settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable naming an explicit settings file
pub const SETTINGS_PATH_VAR: &str = "ITEMLENS_SETTINGS_PATH";

/// Candidate settings files, in lookup order
pub fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("itemlens.yml"),
        PathBuf::from("config/itemlens.yml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("itemlens/settings.yml"));
    }
    paths
}

/// Load settings from an explicit path, the environment, the default
/// locations, or fall back to defaults; environment overrides are applied last
pub fn load(explicit: Option<&Path>) -> Result<Settings> {
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("Settings file not found: {}", path.display());
        }
    }
    let from_env = std::env::var(SETTINGS_PATH_VAR).ok().map(PathBuf::from);

    let candidate = explicit
        .map(Path::to_path_buf)
        .or(from_env)
        .filter(|p| p.exists())
        .or_else(|| default_paths().into_iter().find(|p| p.exists()));

    let mut settings = match candidate {
        Some(path) => {
            info!("Loading settings from: {}", path.display());
            Settings::from_file(&path)?
        }
        None => {
            info!("No settings file found, using defaults");
            Settings::default()
        }
    };

    settings.merge_env();
    Ok(settings)
}
