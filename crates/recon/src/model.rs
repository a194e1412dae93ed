use serde::{Deserialize, Serialize};

use crate::crossref::CrossReferenceIndex;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A filing as published by the regulatory feed. Identified by its
/// accession number after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalFiling {
    pub accession_id: String,
    pub filing_date: String,
    pub form_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub report_period: String,
    #[serde(default)]
    pub document_url: String,
}

/// A filing record from the analyst's knowledge base. Records created
/// before accession tracking carry no `accession_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalRecord {
    pub date: String,
    pub form_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub report_period: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accession_id: Option<String>,
}

impl InternalRecord {
    /// The accession number, if the record carries a non-blank one.
    pub fn accession(&self) -> Option<&str> {
        self.accession_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// One fact captured elsewhere in the knowledge base about a filing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedFact {
    pub source_label: String,
    pub captured_fact: String,
}

/// Internal records plus the cross-reference index, refreshed together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBase {
    #[serde(default)]
    pub records: Vec<InternalRecord>,
    #[serde(default)]
    pub cross_refs: CrossReferenceIndex,
}

/// Pre-loaded inputs for one reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub filings: Vec<ExternalFiling>,
    pub knowledge: KnowledgeBase,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Three-level ladder: `Tracked` outranks `DataOnly` outranks `New`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Tracked,
    DataOnly,
    New,
}

impl MatchStatus {
    pub fn rank(self) -> u8 {
        match self {
            Self::Tracked => 2,
            Self::DataOnly => 1,
            Self::New => 0,
        }
    }
}

impl PartialOrd for MatchStatus {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MatchStatus {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tracked => write!(f, "tracked"),
            Self::DataOnly => write!(f, "data_only"),
            Self::New => write!(f, "new"),
        }
    }
}

/// Outcome for one external filing. Recomputed wholesale on every pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub filing: ExternalFiling,
    pub status: MatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_record: Option<InternalRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_refs: Option<Vec<CapturedFact>>,
    /// Set by the novelty pass: first seen since the previous load.
    #[serde(default)]
    pub surfaced: bool,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub total: usize,
    pub tracked: usize,
    pub data_only: usize,
    pub new: usize,
    pub surfaced: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub results: Vec<MatchResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub name: String,
    pub subject: String,
    pub engine_version: String,
    pub run_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_ladder_ordering() {
        assert!(MatchStatus::Tracked > MatchStatus::DataOnly);
        assert!(MatchStatus::DataOnly > MatchStatus::New);
        assert_eq!(
            [MatchStatus::New, MatchStatus::Tracked, MatchStatus::DataOnly]
                .into_iter()
                .max(),
            Some(MatchStatus::Tracked)
        );
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(serde_json::to_string(&MatchStatus::DataOnly).unwrap(), "\"data_only\"");
        assert_eq!(MatchStatus::New.to_string(), "new");
    }

    #[test]
    fn blank_accession_counts_as_missing() {
        let mut record = InternalRecord {
            date: "2024-01-01".into(),
            form_type: "10-K".into(),
            description: String::new(),
            report_period: String::new(),
            accession_id: Some("  ".into()),
        };
        assert_eq!(record.accession(), None);
        record.accession_id = Some("0000111-25-5".into());
        assert_eq!(record.accession(), Some("0000111-25-5"));
    }

    #[test]
    fn filing_deserializes_camel_case_with_optional_fields() {
        let json = r#"{"accessionId":"0001-26-1","filingDate":"2026-02-01","formType":"8-K"}"#;
        let filing: ExternalFiling = serde_json::from_str(json).unwrap();
        assert_eq!(filing.accession_id, "0001-26-1");
        assert_eq!(filing.form_type, "8-K");
        assert!(filing.document_url.is_empty());
    }

    #[test]
    fn match_result_skips_absent_fields() {
        let result = MatchResult {
            filing: ExternalFiling {
                accession_id: "X".into(),
                filing_date: "2026-02-01".into(),
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
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "new");
        assert!(json.get("matchedRecord").is_none());
        assert!(json.get("crossRefs").is_none());
    }
}
