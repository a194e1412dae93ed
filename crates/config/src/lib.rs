// Configuration loading

pub mod settings;

use std::path::PathBuf;

pub use settings::Settings;

/// Overrides the config directory (settings + credentials). Used by tests
/// and by hosts that keep per-project state.
pub const CONFIG_DIR_ENV: &str = "FILINGDESK_CONFIG_DIR";

/// Overrides the cache directory.
pub const CACHE_DIR_ENV: &str = "FILINGDESK_CACHE_DIR";

/// Overrides `feed.apiBase`.
pub const API_BASE_ENV: &str = "FILINGDESK_API_BASE";

/// `<platform config dir>/filingdesk`, or `$FILINGDESK_CONFIG_DIR`.
pub fn config_dir() -> PathBuf {
    if let Some(dir) = env_path(CONFIG_DIR_ENV) {
        return dir;
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("filingdesk")
}

/// `<platform cache dir>/filingdesk`, or `$FILINGDESK_CACHE_DIR`.
pub fn default_cache_dir() -> PathBuf {
    if let Some(dir) = env_path(CACHE_DIR_ENV) {
        return dir;
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("filingdesk")
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
