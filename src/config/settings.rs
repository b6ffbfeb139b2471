//! Settings structures for repo-finder configuration

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main settings structure matching settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub search: SearchSettings,
    pub provider: ProviderSettings,
    pub preferences: PreferenceSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Reject values that cannot be used at runtime
    pub fn validate(&self) -> Result<()> {
        let timeout = self.provider.request_timeout;
        ensure!(
            timeout.is_finite() && timeout > 0.0,
            "provider.request_timeout must be a positive number of seconds, got {}",
            timeout
        );
        Ok(())
    }

    /// Merge with environment variables (REPO_FINDER_* prefix)
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    fn merge_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("REPO_FINDER_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Some(val) = var("REPO_FINDER_API_URL") {
            self.provider.api_url = val;
        }
        if let Some(ms) = var("REPO_FINDER_DEBOUNCE_MS").and_then(|v| v.parse().ok()) {
            self.search.debounce_ms = ms;
        }
        if let Some(secs) = var("REPO_FINDER_CACHE_TTL_SECS").and_then(|v| v.parse().ok()) {
            self.search.cache_ttl_secs = secs;
        }
        if let Some(val) = var("REPO_FINDER_PREFERENCES_PATH") {
            self.preferences.path = Some(PathBuf::from(val));
        }
        if let Some(seed) = var("REPO_FINDER_RANDOM_SEED").and_then(|v| v.parse().ok()) {
            self.search.random_seed = Some(seed);
        }
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Name shown in the header
    pub app_name: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            app_name: "Repo Finder".to_string(),
        }
    }
}

/// Search behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Quiet period before text input triggers a search
    pub debounce_ms: u64,
    /// Minimum term length for text input without a language
    pub min_term_length: usize,
    /// Popularity floor added to every query
    pub min_stars: u32,
    /// Results per page requested from the provider
    pub per_page: u32,
    /// Cache freshness window in seconds
    pub cache_ttl_secs: u64,
    /// Maximum number of cached queries
    pub cache_max_capacity: u64,
    /// How long the "found" banner stays up, in seconds
    pub status_dwell_secs: u64,
    /// Seed for random picks (none = OS entropy)
    pub random_seed: Option<u64>,
}

impl SearchSettings {
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn status_dwell(&self) -> Duration {
        Duration::from_secs(self.status_dwell_secs)
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            min_term_length: 3,
            min_stars: crate::query::DEFAULT_MIN_STARS,
            per_page: 15,
            cache_ttl_secs: 300,
            cache_max_capacity: 1000,
            status_dwell_secs: 3,
            random_seed: None,
        }
    }
}

/// Remote provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Repository search endpoint
    pub api_url: String,
    /// User agent sent with every request
    pub user_agent: String,
    /// Request timeout in seconds
    pub request_timeout: f64,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com/search/repositories".to_string(),
            user_agent: format!("repo-finder/{}", crate::VERSION),
            request_timeout: 10.0,
            verify_ssl: true,
            proxies: ProxySettings::default(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Preference persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceSettings {
    /// Persist language/term between sessions
    pub enabled: bool,
    /// Preference file (none = platform config dir)
    pub path: Option<PathBuf>,
    /// Key the preferences are stored under
    pub namespace: String,
}

impl PreferenceSettings {
    /// Resolved preference file location
    pub fn file_path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(|| {
            dirs::config_dir().map(|dir| dir.join("repo-finder").join("preferences.json"))
        })
    }
}

impl Default for PreferenceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            namespace: "repo-finder:preferences".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.search.per_page, 15);
        assert_eq!(settings.search.min_stars, 10);
        assert_eq!(settings.search.cache_ttl(), Duration::from_secs(300));
        assert_eq!(settings.search.status_dwell(), Duration::from_secs(3));
        assert!(!settings.general.debug);
        assert!(settings.provider.api_url.contains("api.github.com"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
search:
  debounce_ms: 250
provider:
  api_url: "http://localhost:9000/search"
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.search.debounce_delay(), Duration::from_millis(250));
        assert_eq!(settings.search.min_term_length, 3);
        assert_eq!(settings.provider.api_url, "http://localhost:9000/search");
        assert!(settings.preferences.enabled);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("REPO_FINDER_DEBUG", "true"),
            ("REPO_FINDER_DEBOUNCE_MS", "100"),
            ("REPO_FINDER_CACHE_TTL_SECS", "not-a-number"),
            ("REPO_FINDER_RANDOM_SEED", "9"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.merge_vars(|key| vars.get(key).map(|v| v.to_string()));

        assert!(settings.general.debug);
        assert_eq!(settings.search.debounce_ms, 100);
        assert_eq!(settings.search.cache_ttl_secs, 300);
        assert_eq!(settings.search.random_seed, Some(9));
    }

    #[test]
    fn test_invalid_request_timeout() {
        assert!(Settings::default().validate().is_ok());

        for yaml in [
            "provider:\n  request_timeout: -1.0\n",
            "provider:\n  request_timeout: .nan\n",
            "provider:\n  request_timeout: 0\n",
        ] {
            let settings = Settings::from_yaml(yaml).unwrap();
            assert!(settings.validate().is_err(), "accepted {:?}", yaml);
        }
    }
}
