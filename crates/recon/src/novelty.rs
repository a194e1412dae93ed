use std::collections::HashSet;

use crate::model::MatchResult;
use crate::normalize::normalize_accession;

/// Tracks which accession numbers the previous successful load contained,
/// so a refresh can report only filings that appeared since then.
///
/// One tracker per session and subject. The observed set is replaced on
/// every load, never accumulated: a filing that drops out of the feed is
/// forgotten and reported again if it comes back.
#[derive(Debug, Default, Clone)]
pub struct NoveltyTracker {
    observed: HashSet<String>,
    loaded: bool,
}

impl NoveltyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True until the first load (observed or seeded) in this session.
    pub fn is_first_load(&self) -> bool {
        !self.loaded
    }

    pub fn observed_count(&self) -> usize {
        self.observed.len()
    }

    /// Record a successful load and return the identifiers that were not in
    /// the previous load, normalized, in first-seen order. The first load of
    /// a session reports nothing.
    pub fn observe<I, S>(&mut self, identifiers: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let current = collect_ids(identifiers);

        let novel = if self.loaded {
            let mut seen = HashSet::new();
            current
                .iter()
                .filter(|id| !self.observed.contains(*id) && seen.insert(id.as_str()))
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        self.observed = current.into_iter().collect();
        self.loaded = true;
        novel
    }

    /// Replay of a cached load: adopt the identifiers without reporting any.
    pub fn seed<I, S>(&mut self, identifiers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.observed = collect_ids(identifiers).into_iter().collect();
        self.loaded = true;
    }

    pub fn is_observed(&self, accession_id: &str) -> bool {
        self.observed.contains(&normalize_accession(accession_id))
    }
}

fn collect_ids<I, S>(identifiers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    identifiers
        .into_iter()
        .map(|id| normalize_accession(id.as_ref()))
        .filter(|id| !id.is_empty())
        .collect()
}

/// Mark results whose filing is in `novel` as surfaced.
pub fn annotate(results: Vec<MatchResult>, novel: &[String]) -> Vec<MatchResult> {
    if novel.is_empty() {
        return results;
    }
    let novel: HashSet<&str> = novel.iter().map(String::as_str).collect();
    results
        .into_iter()
        .map(|mut r| {
            r.surfaced = novel.contains(normalize_accession(&r.filing.accession_id).as_str());
            r
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExternalFiling, MatchStatus};

    #[test]
    fn first_load_flags_nothing() {
        let mut tracker = NoveltyTracker::new();
        assert!(tracker.is_first_load());
        assert!(tracker.observe(["A", "B"]).is_empty());
        assert!(!tracker.is_first_load());
        assert_eq!(tracker.observed_count(), 2);
    }

    #[test]
    fn subsequent_loads_flag_only_new_ids() {
        let mut tracker = NoveltyTracker::new();
        tracker.observe(["A", "B"]);
        assert_eq!(tracker.observe(["A", "B", "C"]), vec!["C"]);
        assert!(tracker.observe(["A"]).is_empty());
        // C dropped out in between, so it is novel again
        assert_eq!(tracker.observe(["A", "C"]), vec!["C"]);
    }

    #[test]
    fn identifiers_compare_normalized() {
        let mut tracker = NoveltyTracker::new();
        tracker.observe(["0001-26-000123"]);
        assert_eq!(tracker.observe(["000126000123", "0002-26-1"]), vec!["000226000001"]);
        assert!(tracker.is_observed("0002-26-1"));
    }

    #[test]
    fn duplicates_within_a_load_reported_once() {
        let mut tracker = NoveltyTracker::new();
        tracker.observe(Vec::<String>::new());
        assert_eq!(tracker.observe(["N-1", "N1", "N-1"]), vec!["N1"]);
    }

    #[test]
    fn seeding_counts_as_first_load() {
        let mut tracker = NoveltyTracker::new();
        tracker.seed(["A", "B"]);
        assert!(!tracker.is_first_load());
        assert_eq!(tracker.observe(["A", "B", "C"]), vec!["C"]);
    }

    #[test]
    fn empty_first_load_still_counts() {
        let mut tracker = NoveltyTracker::new();
        assert!(tracker.observe(Vec::<&str>::new()).is_empty());
        assert_eq!(tracker.observe(["A"]), vec!["A"]);
    }

    #[test]
    fn annotate_marks_surfaced() {
        let result = |id: &str| MatchResult {
            filing: ExternalFiling {
                accession_id: id.into(),
                filing_date: "2026-01-01".into(),
                form_type: "8-K".into(),
                description: String::new(),
                report_period: String::new(),
                document_url: String::new(),
            },
            status: MatchStatus::New,
            matched_record: None,
            cross_refs: None,
            surfaced: false,
        };
        let annotated = annotate(vec![result("A-1"), result("B-2")], &["B2".to_string()]);
        assert!(!annotated[0].surfaced);
        assert!(annotated[1].surfaced);
    }
}
