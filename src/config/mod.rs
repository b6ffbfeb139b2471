//! Configuration module for repo-finder
//!
//! Handles loading settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable naming an explicit settings file
pub const SETTINGS_PATH_ENV: &str = "REPO_FINDER_SETTINGS_PATH";

/// Load settings, preferring an explicit path, then the environment, then
/// the default locations. Falls back to defaults when no file is found.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    if let Some(path) = explicit {
        info!("Loading settings from: {}", path.display());
        return from_path(path);
    }

    if let Ok(path) = std::env::var(SETTINGS_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            info!("Loading settings from: {}", path.display());
            return from_path(&path);
        }
    }

    for path in default_paths() {
        if path.exists() {
            info!("Loading settings from: {}", path.display());
            return from_path(&path);
        }
    }

    info!("No settings file found, using defaults");
    let mut settings = Settings::default();
    settings.merge_env();
    settings.validate()?;
    Ok(settings)
}

fn from_path(path: &Path) -> Result<Settings> {
    let mut settings = Settings::from_file(path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;
    settings.merge_env();
    settings.validate()?;
    Ok(settings)
}

fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("settings.yml"),
        PathBuf::from("config/settings.yml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("repo-finder/settings.yml"));
    }
    paths
}
