use crate::model::{MatchResult, MatchStatus, ReconSummary};

/// Compute summary statistics from classified results.
pub fn compute_summary(results: &[MatchResult]) -> ReconSummary {
    let mut summary = ReconSummary {
        total: results.len(),
        ..ReconSummary::default()
    };

    for r in results {
        match r.status {
            MatchStatus::Tracked => summary.tracked += 1,
            MatchStatus::DataOnly => summary.data_only += 1,
            MatchStatus::New => summary.new += 1,
        }
        if r.surfaced {
            summary.surfaced += 1;
        }
    }

    summary
}
