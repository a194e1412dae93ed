//! Best-effort caches over a host key-value store.
//!
//! Nothing here returns an error to the caller. A store that cannot be read
//! or holds garbage behaves like an empty store; a failed write is logged
//! and forgotten. Writes are last-writer-wins and unsynchronized, which
//! holds only while a single thread owns the cache.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::ExternalFiling;
use crate::normalize::normalize_accession;

/// Default feed-cache lifetime.
pub const DEFAULT_FEED_TTL_MINUTES: i64 = 15;

/// String key-value store supplied by the host.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-process store. Lives as long as the value does.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Subjects key case-insensitively: `" acme"` and `"ACME"` share entries.
pub fn subject_key(subject: &str) -> String {
    subject.trim().to_uppercase()
}

// ---------------------------------------------------------------------------
// Feed cache
// ---------------------------------------------------------------------------

/// Last successful feed fetch for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedFeed {
    pub fetched_at: DateTime<Utc>,
    pub filings: Vec<ExternalFiling>,
}

/// Time-bounded cache of fetched filing collections, keyed by subject.
pub struct FeedCache<S: KvStore> {
    store: S,
    ttl: Duration,
}

impl<S: KvStore> FeedCache<S> {
    pub fn new(store: S) -> Self {
        Self::with_ttl(store, Duration::minutes(DEFAULT_FEED_TTL_MINUTES))
    }

    pub fn with_ttl(store: S, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn key(subject: &str) -> String {
        format!("feed:{}", subject_key(subject))
    }

    /// Entry for `subject` if it was written less than one TTL before `now`.
    /// Expired or unreadable entries are evicted.
    pub fn get_at(&mut self, subject: &str, now: DateTime<Utc>) -> Option<CachedFeed> {
        let key = Self::key(subject);
        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("feed cache read failed for {key}: {e}");
                return None;
            }
        };

        let entry: CachedFeed = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("feed cache entry {key} is corrupt, evicting: {e}");
                self.evict(&key);
                return None;
            }
        };

        if now.signed_duration_since(entry.fetched_at) < self.ttl {
            log::debug!("feed cache hit for {key}");
            Some(entry)
        } else {
            log::debug!("feed cache entry {key} expired, evicting");
            self.evict(&key);
            None
        }
    }

    pub fn get(&mut self, subject: &str) -> Option<CachedFeed> {
        self.get_at(subject, Utc::now())
    }

    /// Overwrite the entry for `subject`.
    pub fn put_at(&mut self, subject: &str, filings: &[ExternalFiling], now: DateTime<Utc>) {
        let key = Self::key(subject);
        let entry = CachedFeed {
            fetched_at: now,
            filings: filings.to_vec(),
        };
        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("feed cache entry {key} not serializable: {e}");
                return;
            }
        };
        if let Err(e) = self.store.set(&key, raw) {
            log::warn!("feed cache write failed for {key}: {e}");
        }
    }

    pub fn put(&mut self, subject: &str, filings: &[ExternalFiling]) {
        self.put_at(subject, filings, Utc::now())
    }

    pub fn invalidate(&mut self, subject: &str) {
        let key = Self::key(subject);
        self.evict(&key);
    }

    fn evict(&mut self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            log::warn!("feed cache eviction failed for {key}: {e}");
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

// ---------------------------------------------------------------------------
// Narrative cache
// ---------------------------------------------------------------------------

/// Analysis text per `(subject, filing)`. No expiry and no eviction: entries
/// live until removed or until the backing store goes away. Growth over a
/// long session is accepted.
pub struct NarrativeCache<S: KvStore> {
    store: S,
}

impl<S: KvStore> NarrativeCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn key(subject: &str, accession_id: &str) -> String {
        format!("narrative:{}:{}", subject_key(subject), normalize_accession(accession_id))
    }

    pub fn get(&self, subject: &str, accession_id: &str) -> Option<String> {
        let key = Self::key(subject, accession_id);
        match self.store.get(&key) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("narrative cache read failed for {key}: {e}");
                None
            }
        }
    }

    pub fn set(&mut self, subject: &str, accession_id: &str, text: impl Into<String>) {
        let key = Self::key(subject, accession_id);
        if let Err(e) = self.store.set(&key, text.into()) {
            log::warn!("narrative cache write failed for {key}: {e}");
        }
    }

    pub fn remove(&mut self, subject: &str, accession_id: &str) {
        let key = Self::key(subject, accession_id);
        if let Err(e) = self.store.remove(&key) {
            log::warn!("narrative cache remove failed for {key}: {e}");
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn filing(id: &str) -> ExternalFiling {
        ExternalFiling {
            accession_id: id.into(),
            filing_date: "2026-02-01".into(),
            form_type: "8-K".into(),
            description: String::new(),
            report_period: String::new(),
            document_url: String::new(),
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap()
    }

    /// Store that fails every call.
    struct BrokenStore;

    impl KvStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("disk gone".into()))
        }
        fn set(&mut self, _key: &str, _value: String) -> Result<(), StoreError> {
            Err(StoreError::Write("quota exceeded".into()))
        }
        fn remove(&mut self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Write("quota exceeded".into()))
        }
    }

    #[test]
    fn feed_entry_valid_until_ttl() {
        let mut cache = FeedCache::new(MemoryStore::new());
        cache.put_at("ACME", &[filing("A")], t0());

        let hit = cache.get_at("ACME", t0() + Duration::minutes(14) + Duration::seconds(59));
        assert_eq!(hit.unwrap().filings.len(), 1);

        assert!(cache.get_at("ACME", t0() + Duration::minutes(15) + Duration::seconds(1)).is_none());
    }

    #[test]
    fn expired_entry_is_evicted_on_read() {
        let mut cache = FeedCache::new(MemoryStore::new());
        cache.put_at("ACME", &[filing("A")], t0());
        assert!(cache.get_at("ACME", t0() + Duration::minutes(20)).is_none());
        assert!(cache.store().is_empty());
        // Still absent even when read "in the past"
        assert!(cache.get_at("ACME", t0()).is_none());
    }

    #[test]
    fn writes_overwrite_and_subjects_are_case_insensitive() {
        let mut cache = FeedCache::new(MemoryStore::new());
        cache.put_at("acme", &[filing("A")], t0());
        cache.put_at(" ACME ", &[filing("A"), filing("B")], t0() + Duration::minutes(1));

        let hit = cache.get_at("Acme", t0() + Duration::minutes(2)).unwrap();
        assert_eq!(hit.filings.len(), 2);
        assert_eq!(hit.fetched_at, t0() + Duration::minutes(1));
        assert!(cache.get_at("OTHER", t0()).is_none());
    }

    #[test]
    fn corrupt_entry_is_a_miss() {
        let mut store = MemoryStore::new();
        store.set("feed:ACME", "{not json".into()).unwrap();
        let mut cache = FeedCache::new(store);
        assert!(cache.get_at("ACME", t0()).is_none());
        assert!(cache.store().is_empty());
    }

    #[test]
    fn broken_store_never_errors() {
        let mut feed = FeedCache::new(BrokenStore);
        feed.put_at("ACME", &[filing("A")], t0());
        assert!(feed.get_at("ACME", t0()).is_none());
        feed.invalidate("ACME");

        let mut narratives = NarrativeCache::new(BrokenStore);
        narratives.set("ACME", "A", "text");
        assert!(narratives.get("ACME", "A").is_none());
        narratives.remove("ACME", "A");
    }

    #[test]
    fn custom_ttl() {
        let mut cache = FeedCache::with_ttl(MemoryStore::new(), Duration::minutes(1));
        cache.put_at("ACME", &[], t0());
        assert!(cache.get_at("ACME", t0() + Duration::seconds(59)).is_some());
        assert!(cache.get_at("ACME", t0() + Duration::seconds(61)).is_none());
    }

    #[test]
    fn narrative_set_get_remove() {
        let mut cache = NarrativeCache::new(MemoryStore::new());
        assert!(cache.get("ACME", "0001-26-1").is_none());

        cache.set("ACME", "0001-26-1", "[VERDICT: low] — routine filing");
        assert_eq!(
            cache.get("acme", "000126000001").as_deref(),
            Some("[VERDICT: low] — routine filing")
        );
        assert!(cache.get("OTHER", "0001-26-1").is_none());

        cache.remove("ACME", "0001-26-1");
        assert!(cache.get("ACME", "0001-26-1").is_none());
    }
}
