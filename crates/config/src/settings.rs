// User settings
// Loaded from ~/.config/filingdesk/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_BASE: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_FEED_TTL_MINUTES: i64 = 15;
/// Longest accepted feed-cache lifetime: one week.
pub const MAX_FEED_TTL_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Feed
    #[serde(rename = "feed.apiBase")]
    pub api_base: Option<String>,

    #[serde(rename = "feed.timeoutSecs")]
    pub timeout_secs: u64,

    // Cache
    #[serde(rename = "cache.feedTtlMinutes")]
    pub feed_ttl_minutes: i64,

    #[serde(rename = "cache.dir")]
    pub cache_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: None, // None = env or built-in default
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            feed_ttl_minutes: DEFAULT_FEED_TTL_MINUTES,
            cache_dir: None,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        crate::config_dir().join("settings.json")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            let settings = Self::default();
            settings.create_default_file(&path);
            return settings;
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path. Missing, unreadable or malformed files
    /// yield defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => {
                // Strip comments (lines starting with //)
                let cleaned: String = contents
                    .lines()
                    .filter(|line| !line.trim().starts_with("//"))
                    .collect::<Vec<_>>()
                    .join("\n");

                match serde_json::from_str(&cleaned) {
                    Ok(settings) => settings,
                    Err(e) => {
                        log::warn!("error parsing {}: {e}; using default settings", path.display());
                        Self::default()
                    }
                }
            }
            Err(e) => {
                log::debug!("cannot read {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Save current settings to disk
    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// `$FILINGDESK_API_BASE`, then `feed.apiBase`, then the built-in
    /// default. Trailing slashes are dropped.
    pub fn effective_api_base(&self) -> String {
        let from_env = std::env::var(crate::API_BASE_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty());
        let base = from_env
            .or_else(|| self.api_base.clone().filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        base.trim().trim_end_matches('/').to_string()
    }

    pub fn effective_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(crate::default_cache_dir)
    }

    /// TTL in minutes, clamped to between one minute and one week.
    pub fn effective_feed_ttl_minutes(&self) -> i64 {
        if self.feed_ttl_minutes > MAX_FEED_TTL_MINUTES {
            log::warn!(
                "cache.feedTtlMinutes = {} exceeds {MAX_FEED_TTL_MINUTES}, clamping",
                self.feed_ttl_minutes
            );
        }
        self.feed_ttl_minutes.clamp(1, MAX_FEED_TTL_MINUTES)
    }

    /// Create default settings file with comments
    fn create_default_file(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("error creating config directory: {e}");
                return;
            }
        }

        let default_config = r#"{
    // Filing feed service (FILINGDESK_API_BASE overrides)
    "feed.apiBase": null,
    "feed.timeoutSecs": 30,

    // Feed cache lifetime; narrative analyses never expire
    "cache.feedTtlMinutes": 15,
    "cache.dir": null
}
"#;

        if let Err(e) = fs::write(path, default_config) {
            log::warn!("error writing default settings.json: {e}");
        }
    }

    /// Get the config file path for display/opening
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}
