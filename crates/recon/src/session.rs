//! Refresh orchestration for one subject.
//!
//! A refresh fetches the filing feed first and applies it immediately
//! (feed cache, novelty set, held filings). The knowledge-base refresh runs
//! afterwards and is best-effort: its failure keeps the records already held
//! and never undoes the feed update.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::{FeedCache, KvStore};
use crate::error::{FetchError, ReconError};
use crate::matcher::reconcile;
use crate::model::{ExternalFiling, KnowledgeBase, MatchResult};
use crate::novelty::{annotate, NoveltyTracker};

/// Source of the regulatory filing feed.
pub trait FilingFeed {
    fn fetch_filings(&self, subject: &str) -> Result<Vec<ExternalFiling>, FetchError>;
}

/// Source of refreshed internal records and cross-reference evidence.
pub trait RecordSource {
    fn fetch_knowledge(&self, subject: &str) -> Result<KnowledgeBase, FetchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOrigin {
    /// Replayed from the feed cache; nothing fetched.
    Cache,
    /// Fetched from the feed.
    Feed,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshOutcome {
    pub origin: LoadOrigin,
    pub fetched_at: DateTime<Utc>,
    pub results: Vec<MatchResult>,
    /// Normalized accession numbers first seen in this load.
    pub novel: Vec<String>,
    pub knowledge_refreshed: bool,
}

/// Session state for one subject: held filings and knowledge, the feed
/// cache and the novelty tracker.
///
/// Loads take `&mut self`, so two refreshes of the same session cannot
/// overlap; a caller that wants a second refresh waits for the first.
pub struct ReconSession<S: KvStore> {
    subject: String,
    filings: Vec<ExternalFiling>,
    knowledge: KnowledgeBase,
    feed_cache: FeedCache<S>,
    novelty: NoveltyTracker,
}

impl<S: KvStore> ReconSession<S> {
    pub fn new(subject: impl Into<String>, knowledge: KnowledgeBase, feed_cache: FeedCache<S>) -> Self {
        Self {
            subject: subject.into(),
            filings: Vec::new(),
            knowledge,
            feed_cache,
            novelty: NoveltyTracker::new(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn filings(&self) -> &[ExternalFiling] {
        &self.filings
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn novelty(&self) -> &NoveltyTracker {
        &self.novelty
    }

    pub fn feed_cache(&self) -> &FeedCache<S> {
        &self.feed_cache
    }

    /// Reconcile what the session currently holds. No novelty annotation.
    pub fn results(&self) -> Vec<MatchResult> {
        reconcile(&self.filings, &self.knowledge.records, &self.knowledge.cross_refs)
    }

    /// Initial load: replay a fresh feed-cache entry if there is one,
    /// otherwise refresh from the sources.
    pub fn load(
        &mut self,
        feed: &dyn FilingFeed,
        records: &dyn RecordSource,
        now: DateTime<Utc>,
    ) -> Result<RefreshOutcome, ReconError> {
        if let Some(cached) = self.feed_cache.get_at(&self.subject, now) {
            log::info!(
                "{}: restored {} filings from cache (fetched {})",
                self.subject,
                cached.filings.len(),
                cached.fetched_at.to_rfc3339()
            );
            // Replay, not discovery: seed without flagging anything.
            self.novelty
                .seed(cached.filings.iter().map(|f| f.accession_id.as_str()));
            self.filings = cached.filings;
            return Ok(RefreshOutcome {
                origin: LoadOrigin::Cache,
                fetched_at: cached.fetched_at,
                results: self.results(),
                novel: Vec::new(),
                knowledge_refreshed: false,
            });
        }

        self.refresh(feed, records, now)
    }

    /// Best-effort knowledge refresh. On failure the records already held
    /// are kept and the error is only logged. Returns whether new knowledge
    /// was applied.
    pub fn refresh_knowledge(&mut self, records: &dyn RecordSource) -> bool {
        match records.fetch_knowledge(&self.subject) {
            Ok(knowledge) => {
                self.knowledge = knowledge;
                true
            }
            Err(e) => {
                // Deliberately dropped: only feed failures reach the caller.
                log::warn!("{}: knowledge refresh failed, keeping previous records: {e}", self.subject);
                false
            }
        }
    }

    /// Explicit refresh: always fetches, bypassing the feed cache.
    pub fn refresh(
        &mut self,
        feed: &dyn FilingFeed,
        records: &dyn RecordSource,
        now: DateTime<Utc>,
    ) -> Result<RefreshOutcome, ReconError> {
        let filings = feed
            .fetch_filings(&self.subject)
            .map_err(|source| ReconError::Feed {
                subject: self.subject.clone(),
                source,
            })?;
        log::info!("{}: fetched {} filings", self.subject, filings.len());

        self.feed_cache.put_at(&self.subject, &filings, now);
        let novel = self
            .novelty
            .observe(filings.iter().map(|f| f.accession_id.as_str()));
        self.filings = filings;

        // The feed update above stays applied whatever happens here.
        let knowledge_refreshed = self.refresh_knowledge(records);

        if !novel.is_empty() {
            log::info!("{}: {} filing(s) surfaced since last load", self.subject, novel.len());
        }

        Ok(RefreshOutcome {
            origin: LoadOrigin::Feed,
            fetched_at: now,
            results: annotate(self.results(), &novel),
            novel,
            knowledge_refreshed,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::cache::MemoryStore;
    use crate::model::{CapturedFact, InternalRecord, MatchStatus};

    struct ScriptedFeed {
        responses: RefCell<Vec<Result<Vec<ExternalFiling>, FetchError>>>,
        calls: Cell<usize>,
    }

    impl ScriptedFeed {
        fn new(responses: Vec<Result<Vec<ExternalFiling>, FetchError>>) -> Self {
            Self {
                responses: RefCell::new(responses),
                calls: Cell::new(0),
            }
        }
    }

    impl FilingFeed for ScriptedFeed {
        fn fetch_filings(&self, _subject: &str) -> Result<Vec<ExternalFiling>, FetchError> {
            self.calls.set(self.calls.get() + 1);
            self.responses.borrow_mut().remove(0)
        }
    }

    struct FixedRecords(Result<KnowledgeBase, FetchError>);

    impl RecordSource for FixedRecords {
        fn fetch_knowledge(&self, _subject: &str) -> Result<KnowledgeBase, FetchError> {
            self.0.clone()
        }
    }

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

    fn knowledge_tracking(id: &str) -> KnowledgeBase {
        KnowledgeBase {
            records: vec![InternalRecord {
                date: "2026-02-01".into(),
                form_type: "8-K".into(),
                description: String::new(),
                report_period: String::new(),
                accession_id: Some(id.into()),
            }],
            cross_refs: Default::default(),
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap()
    }

    fn session() -> ReconSession<MemoryStore> {
        ReconSession::new("ACME", KnowledgeBase::default(), FeedCache::new(MemoryStore::new()))
    }

    #[test]
    fn first_load_fetches_and_flags_nothing() {
        let feed = ScriptedFeed::new(vec![Ok(vec![filing("A"), filing("B")])]);
        let records = FixedRecords(Ok(knowledge_tracking("A")));
        let mut s = session();

        let out = s.load(&feed, &records, t0()).unwrap();
        assert_eq!(out.origin, LoadOrigin::Feed);
        assert!(out.novel.is_empty());
        assert!(out.knowledge_refreshed);
        assert_eq!(out.results[0].status, MatchStatus::Tracked);
        assert_eq!(out.results[1].status, MatchStatus::New);
        assert!(out.results.iter().all(|r| !r.surfaced));
    }

    #[test]
    fn refresh_surfaces_new_filings() {
        let feed = ScriptedFeed::new(vec![
            Ok(vec![filing("A"), filing("B")]),
            Ok(vec![filing("A"), filing("B"), filing("C")]),
        ]);
        let records = FixedRecords(Ok(KnowledgeBase::default()));
        let mut s = session();

        s.load(&feed, &records, t0()).unwrap();
        let out = s.refresh(&feed, &records, t0() + Duration::minutes(1)).unwrap();
        assert_eq!(out.novel, vec!["C"]);
        let surfaced: Vec<&str> = out
            .results
            .iter()
            .filter(|r| r.surfaced)
            .map(|r| r.filing.accession_id.as_str())
            .collect();
        assert_eq!(surfaced, vec!["C"]);
    }

    #[test]
    fn cached_load_replays_without_fetching_or_flagging() {
        let feed = ScriptedFeed::new(vec![
            Ok(vec![filing("A")]),
            Ok(vec![filing("A"), filing("B")]),
        ]);
        let records = FixedRecords(Ok(KnowledgeBase::default()));

        let mut first = session();
        first.load(&feed, &records, t0()).unwrap();
        let store = first.feed_cache.into_store();

        // New session over the same store within the TTL
        let mut second = ReconSession::new("acme", KnowledgeBase::default(), FeedCache::new(store));
        let out = second.load(&feed, &records, t0() + Duration::minutes(5)).unwrap();
        assert_eq!(out.origin, LoadOrigin::Cache);
        assert_eq!(out.fetched_at, t0());
        assert!(out.novel.is_empty());
        assert_eq!(feed.calls.get(), 1);

        // The seeded set is the baseline for the next refresh
        let out = second.refresh(&feed, &records, t0() + Duration::minutes(6)).unwrap();
        assert_eq!(out.novel, vec!["B"]);
    }

    #[test]
    fn expired_cache_falls_through_to_fetch() {
        let feed = ScriptedFeed::new(vec![Ok(vec![filing("A")]), Ok(vec![filing("A")])]);
        let records = FixedRecords(Ok(KnowledgeBase::default()));
        let mut s = session();
        s.load(&feed, &records, t0()).unwrap();

        let out = s.load(&feed, &records, t0() + Duration::minutes(16)).unwrap();
        assert_eq!(out.origin, LoadOrigin::Feed);
        assert_eq!(feed.calls.get(), 2);
    }

    #[test]
    fn feed_failure_applies_nothing() {
        let feed = ScriptedFeed::new(vec![
            Ok(vec![filing("A")]),
            Err(FetchError::with_status("service unavailable", 503)),
        ]);
        let records = FixedRecords(Ok(KnowledgeBase::default()));
        let mut s = session();
        s.load(&feed, &records, t0()).unwrap();

        let err = s.refresh(&feed, &records, t0() + Duration::minutes(1)).unwrap_err();
        match err {
            ReconError::Feed { subject, source } => {
                assert_eq!(subject, "ACME");
                assert_eq!(source.status, Some(503));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(s.filings().len(), 1);
        assert_eq!(s.novelty().observed_count(), 1);
    }

    #[test]
    fn knowledge_failure_keeps_feed_update_and_previous_records() {
        let feed = ScriptedFeed::new(vec![Ok(vec![filing("A"), filing("X")])]);
        let records = FixedRecords(Err(FetchError::new("timeout")));
        let mut previous = knowledge_tracking("A");
        previous.cross_refs = [(
            "X",
            vec![CapturedFact {
                source_label: "timeline".into(),
                captured_fact: "held".into(),
            }],
        )]
        .into_iter()
        .collect();

        let mut s = ReconSession::new("ACME", previous, FeedCache::new(MemoryStore::new()));
        let out = s.refresh(&feed, &records, t0()).unwrap();

        assert!(!out.knowledge_refreshed);
        assert_eq!(s.filings().len(), 2);
        assert_eq!(out.results[0].status, MatchStatus::Tracked);
        assert_eq!(out.results[1].status, MatchStatus::DataOnly);
        assert!(s.feed_cache().store().len() == 1);
    }

    #[test]
    fn knowledge_can_be_refreshed_after_replay() {
        let feed = ScriptedFeed::new(vec![Ok(vec![filing("A")])]);
        let mut cache = FeedCache::new(MemoryStore::new());
        cache.put_at("ACME", &[filing("A")], t0());

        let mut s = ReconSession::new("ACME", KnowledgeBase::default(), cache);
        let out = s.load(&feed, &FixedRecords(Ok(KnowledgeBase::default())), t0()).unwrap();
        assert_eq!(out.origin, LoadOrigin::Cache);
        assert_eq!(out.results[0].status, MatchStatus::New);

        assert!(!s.refresh_knowledge(&FixedRecords(Err(FetchError::new("offline")))));
        assert!(s.refresh_knowledge(&FixedRecords(Ok(knowledge_tracking("A")))));
        assert_eq!(s.results()[0].status, MatchStatus::Tracked);
        assert_eq!(feed.calls.get(), 0);
    }
}
