use std::collections::HashMap;

use crate::crossref::CrossReferenceIndex;
use crate::model::{ExternalFiling, InternalRecord, MatchResult, MatchStatus};
use crate::normalize::{date_neighbors, normalize_accession, normalize_date, normalize_form};

/// Internal records split by identifier scheme.
struct RecordPools<'a> {
    by_accession: HashMap<String, &'a InternalRecord>,
    /// Records without an accession number, in input order.
    legacy: Vec<&'a InternalRecord>,
}

impl<'a> RecordPools<'a> {
    fn partition(records: &'a [InternalRecord]) -> Self {
        let mut by_accession = HashMap::new();
        let mut legacy = Vec::new();

        for record in records {
            match record.accession().map(normalize_accession) {
                Some(key) if !key.is_empty() => {
                    by_accession.entry(key).or_insert(record);
                }
                _ => legacy.push(record),
            }
        }

        Self { by_accession, legacy }
    }

    /// Tier 1: exact accession match.
    fn match_accession(&self, filing: &ExternalFiling) -> Option<&'a InternalRecord> {
        let key = normalize_accession(&filing.accession_id);
        if key.is_empty() {
            return None;
        }
        self.by_accession.get(&key).copied()
    }

    /// Tier 2: legacy record with an equivalent form filed within one day.
    fn match_legacy(&self, filing: &ExternalFiling, window: &[String]) -> Option<&'a InternalRecord> {
        let form = normalize_form(&filing.form_type);
        self.legacy
            .iter()
            .find(|record| {
                normalize_form(&record.form_type) == form
                    && window.contains(&normalize_date(&record.date))
            })
            .copied()
    }
}

/// Classify every external filing against the knowledge base.
///
/// Output order follows `external`. Identical input always yields identical
/// output.
pub fn reconcile(
    external: &[ExternalFiling],
    internal: &[InternalRecord],
    cross_refs: &CrossReferenceIndex,
) -> Vec<MatchResult> {
    let pools = RecordPools::partition(internal);
    log::debug!(
        "reconcile: {} filings against {} indexed + {} legacy records",
        external.len(),
        pools.by_accession.len(),
        pools.legacy.len()
    );

    external
        .iter()
        .map(|filing| classify(filing, &pools, cross_refs))
        .collect()
}

fn classify(
    filing: &ExternalFiling,
    pools: &RecordPools<'_>,
    cross_refs: &CrossReferenceIndex,
) -> MatchResult {
    let iso_date = normalize_date(&filing.filing_date);
    let window = date_neighbors(&iso_date);

    let matched_record = pools
        .match_accession(filing)
        .or_else(|| pools.match_legacy(filing, &window));

    let evidence = cross_refs
        .resolve(&filing.accession_id, &filing.form_type, &iso_date)
        .map(<[_]>::to_vec);

    let status = match (&matched_record, &evidence) {
        (Some(_), _) => MatchStatus::Tracked,
        (None, Some(_)) => MatchStatus::DataOnly,
        (None, None) => MatchStatus::New,
    };

    MatchResult {
        filing: filing.clone(),
        status,
        matched_record: matched_record.cloned(),
        cross_refs: evidence,
        surfaced: false,
    }
}
