//! Host wiring: settings, credentials, feed client and cache stores.

use std::path::PathBuf;
use std::time::Duration;

use filingdesk_config::Settings;
use filingdesk_feed_client::{load_auth, AuthCredentials, FeedClient};
use filingdesk_recon::{FeedCache, KnowledgeBase, NarrativeCache, ReconSession};

use crate::exit_codes::{client_exit_code, EXIT_ERROR};
use crate::store::JsonFileStore;
use crate::CliError;

const FEED_CACHE_FILE: &str = "feed.json";
const NARRATIVE_CACHE_FILE: &str = "narratives.json";

pub struct Host {
    pub settings: Settings,
    pub credentials: Option<AuthCredentials>,
}

impl Host {
    pub fn load() -> Self {
        Self {
            settings: Settings::load(),
            credentials: load_auth(),
        }
    }

    /// `$FILINGDESK_API_BASE`, then the base saved at login, then settings.
    pub fn api_base(&self) -> String {
        let env_set = std::env::var(filingdesk_config::API_BASE_ENV)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false);
        match &self.credentials {
            Some(creds) if !env_set && !creds.api_base.trim().is_empty() => {
                creds.api_base.trim().trim_end_matches('/').to_string()
            }
            _ => self.settings.effective_api_base(),
        }
    }

    pub fn client(&self) -> Result<FeedClient, CliError> {
        let timeout = Duration::from_secs(self.settings.timeout_secs.max(1));
        let client = FeedClient::new(self.api_base(), timeout).map_err(|e| CliError {
            code: client_exit_code(&e),
            message: e.to_string(),
            hint: Some(format!("check feed.apiBase in {}", Settings::config_path_display())),
        })?;
        Ok(client.with_token(self.credentials.as_ref().map(|c| c.token.clone())))
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.settings.effective_cache_dir()
    }

    pub fn feed_cache(&self) -> FeedCache<JsonFileStore> {
        let store = JsonFileStore::open(self.cache_dir().join(FEED_CACHE_FILE));
        FeedCache::with_ttl(
            store,
            chrono::Duration::minutes(self.settings.effective_feed_ttl_minutes()),
        )
    }

    pub fn narrative_cache(&self) -> NarrativeCache<JsonFileStore> {
        NarrativeCache::new(JsonFileStore::open(self.cache_dir().join(NARRATIVE_CACHE_FILE)))
    }

    pub fn session(&self, subject: &str) -> Result<ReconSession<JsonFileStore>, CliError> {
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(CliError::args("subject must not be empty"));
        }
        Ok(ReconSession::new(subject, KnowledgeBase::default(), self.feed_cache()))
    }
}

pub fn io_error(context: impl std::fmt::Display, e: impl std::fmt::Display) -> CliError {
    CliError {
        code: EXIT_ERROR,
        message: format!("{context}: {e}"),
        hint: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oversized_ttl_setting_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let host = Host {
            settings: Settings {
                feed_ttl_minutes: 1_000_000_000_000_000,
                cache_dir: Some(dir.path().to_path_buf()),
                ..Settings::default()
            },
            credentials: None,
        };

        let cache = host.feed_cache();
        assert_eq!(
            cache.ttl(),
            chrono::Duration::minutes(filingdesk_config::settings::MAX_FEED_TTL_MINUTES)
        );
    }
}
