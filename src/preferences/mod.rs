//! User preference persistence
//!
//! Stores the last language filter and search term under a fixed namespace.
//! Failures here are warnings only; they never block a search.

use crate::config::PreferenceSettings;
use crate::query::SearchCriteria;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::warn;

/// Persisted criteria
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub language: Option<String>,
    pub search_term: Option<String>,
}

impl Preferences {
    pub fn criteria(&self) -> SearchCriteria {
        SearchCriteria::new(self.language.as_deref(), self.search_term.as_deref())
    }
}

impl From<&SearchCriteria> for Preferences {
    fn from(criteria: &SearchCriteria) -> Self {
        Self {
            language: criteria.language.clone(),
            search_term: criteria.term.clone(),
        }
    }
}

/// Preference read/write failure
#[derive(Debug, Error)]
pub enum PersistenceWarning {
    #[error("preference storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("preference data is malformed: {0}")]
    Format(#[from] serde_json::Error),
}

/// Key/value preference storage
pub trait PreferenceStore: Send + Sync {
    /// Stored preferences, `None` when nothing was saved yet
    fn load(&self) -> Result<Option<Preferences>, PersistenceWarning>;

    fn save(&self, preferences: &Preferences) -> Result<(), PersistenceWarning>;
}

/// JSON file holding one entry per namespace
pub struct FilePreferenceStore {
    path: PathBuf,
    namespace: String,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            namespace: namespace.into(),
        }
    }

    /// Store described by settings, `None` when disabled or no location
    /// can be determined
    pub fn from_settings(settings: &PreferenceSettings) -> Option<Self> {
        if !settings.enabled {
            return None;
        }
        settings
            .file_path()
            .map(|path| Self::new(path, settings.namespace.clone()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, Preferences>, PersistenceWarning> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> Result<Option<Preferences>, PersistenceWarning> {
        Ok(self.read_all()?.remove(&self.namespace))
    }

    fn save(&self, preferences: &Preferences) -> Result<(), PersistenceWarning> {
        // An unreadable file is left alone; a malformed one is replaced
        let mut all = match self.read_all() {
            Ok(all) => all,
            Err(PersistenceWarning::Format(e)) => {
                warn!(
                    "Replacing malformed preference file {}: {}",
                    self.path.display(),
                    e
                );
                HashMap::new()
            }
            Err(e) => return Err(e),
        };
        all.insert(self.namespace.clone(), preferences.clone());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&all)?)?;
        Ok(())
    }
}

/// Session-only store
#[derive(Default)]
pub struct MemoryPreferenceStore {
    preferences: Mutex<Option<Preferences>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preferences(preferences: Preferences) -> Self {
        Self {
            preferences: Mutex::new(Some(preferences)),
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> Result<Option<Preferences>, PersistenceWarning> {
        Ok(self
            .preferences
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn save(&self, preferences: &Preferences) -> Result<(), PersistenceWarning> {
        *self
            .preferences
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(preferences.clone());
        Ok(())
    }
}
