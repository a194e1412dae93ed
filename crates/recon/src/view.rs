//! Filtering and year grouping of classified results for display.

use std::str::FromStr;

use serde::Serialize;

use crate::model::{MatchResult, MatchStatus};
use crate::normalize::{normalize_date, normalize_form};

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormCategory {
    Annual,
    Quarterly,
    Current,
    Ownership,
    Prospectus,
    Proxy,
    Other,
}

type Predicate = fn(&str) -> bool;

/// Ordered: the first predicate that accepts a normalized label decides.
const CATEGORY_PREDICATES: &[(FormCategory, Predicate)] = &[
    (FormCategory::Annual, is_annual),
    (FormCategory::Quarterly, is_quarterly),
    (FormCategory::Current, is_current),
    (FormCategory::Ownership, is_ownership),
    (FormCategory::Prospectus, is_prospectus),
    (FormCategory::Proxy, is_proxy),
];

fn starts_with_any(form: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|p| form.starts_with(p))
}

fn is_annual(form: &str) -> bool {
    starts_with_any(form, &["10K", "20F", "40F"])
}

fn is_quarterly(form: &str) -> bool {
    form.starts_with("10Q")
}

fn is_current(form: &str) -> bool {
    starts_with_any(form, &["8K", "6K"])
}

fn is_ownership(form: &str) -> bool {
    matches!(form, "3" | "3A" | "4" | "4A" | "5" | "5A") || starts_with_any(form, &["SC13", "144"])
}

fn is_prospectus(form: &str) -> bool {
    form == "FWP" || starts_with_any(form, &["S1", "S3", "S4", "S8", "F1", "F3", "424"])
}

fn is_proxy(form: &str) -> bool {
    starts_with_any(form, &["DEF14A", "DEFA14A", "DEFM14A", "DEFR14A", "PRE14A", "PRER14A"])
}

impl FormCategory {
    pub const ALL: [FormCategory; 7] = [
        Self::Annual,
        Self::Quarterly,
        Self::Current,
        Self::Ownership,
        Self::Prospectus,
        Self::Proxy,
        Self::Other,
    ];

    /// Category of a raw form label. Never fails: unknown labels are `Other`.
    pub fn of(form_label: &str) -> Self {
        let form = normalize_form(form_label);
        CATEGORY_PREDICATES
            .iter()
            .find(|(_, accepts)| accepts(form.as_str()))
            .map(|(category, _)| *category)
            .unwrap_or(Self::Other)
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Quarterly => "quarterly",
            Self::Current => "current",
            Self::Ownership => "ownership",
            Self::Prospectus => "prospectus",
            Self::Proxy => "proxy",
            Self::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Annual => "Annual Report",
            Self::Quarterly => "Quarterly Report",
            Self::Current => "Current Report",
            Self::Ownership => "Ownership",
            Self::Prospectus => "Prospectus",
            Self::Proxy => "Proxy",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for FormCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewFilter {
    #[default]
    All,
    NewOnly,
    DataOnly,
    Category(FormCategory),
}

impl ViewFilter {
    pub fn accepts(&self, result: &MatchResult) -> bool {
        match self {
            Self::All => true,
            Self::NewOnly => result.status == MatchStatus::New,
            Self::DataOnly => result.status == MatchStatus::DataOnly,
            Self::Category(category) => FormCategory::of(&result.filing.form_type) == *category,
        }
    }
}

impl FromStr for ViewFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slug = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match slug.as_str() {
            "all" => Ok(Self::All),
            "new" | "new_only" => Ok(Self::NewOnly),
            "data_only" | "data" => Ok(Self::DataOnly),
            other => FormCategory::ALL
                .into_iter()
                .find(|c| c.slug() == other)
                .map(Self::Category)
                .ok_or_else(|| {
                    format!(
                        "unknown filter '{s}' (expected all, new, data_only, {})",
                        FormCategory::ALL.map(FormCategory::slug).join(", ")
                    )
                }),
        }
    }
}

impl std::fmt::Display for ViewFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::NewOnly => write!(f, "new"),
            Self::DataOnly => write!(f, "data_only"),
            Self::Category(c) => write!(f, "{}", c.slug()),
        }
    }
}

pub fn filter_results<'a>(results: &'a [MatchResult], filter: ViewFilter) -> Vec<&'a MatchResult> {
    results.iter().filter(|r| filter.accepts(r)).collect()
}

/// Filings per category in `ALL` order, zero counts included.
pub fn category_counts(results: &[MatchResult]) -> Vec<(FormCategory, usize)> {
    let mut counts: Vec<(FormCategory, usize)> = FormCategory::ALL.iter().map(|c| (*c, 0)).collect();
    for r in results {
        let category = FormCategory::of(&r.filing.form_type);
        if let Some(slot) = counts.iter_mut().find(|(c, _)| *c == category) {
            slot.1 += 1;
        }
    }
    counts
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

pub const UNKNOWN_YEAR: &str = "Unknown";

#[derive(Debug, Clone, Serialize)]
pub struct YearGroup<'a> {
    pub year: String,
    pub results: Vec<&'a MatchResult>,
    pub tracked: usize,
    pub total: usize,
}

/// Four-digit year of a filing date, or `"Unknown"`.
pub fn filing_year(filing_date: &str) -> String {
    let iso = normalize_date(filing_date);
    match iso.get(..4) {
        Some(year) if year.chars().all(|c| c.is_ascii_digit()) => year.to_string(),
        _ => UNKNOWN_YEAR.to_string(),
    }
}

/// Filter, then group by year. Groups appear in first-seen order of the
/// filtered sequence, not calendar order.
pub fn group_by_year<'a>(results: &'a [MatchResult], filter: ViewFilter) -> Vec<YearGroup<'a>> {
    let mut groups: Vec<YearGroup<'a>> = Vec::new();

    for result in filter_results(results, filter) {
        let year = filing_year(&result.filing.filing_date);
        let idx = match groups.iter().position(|g| g.year == year) {
            Some(idx) => idx,
            None => {
                groups.push(YearGroup {
                    year,
                    results: Vec::new(),
                    tracked: 0,
                    total: 0,
                });
                groups.len() - 1
            }
        };

        let group = &mut groups[idx];
        group.results.push(result);
        group.total += 1;
        if result.status == MatchStatus::Tracked {
            group.tracked += 1;
        }
    }

    groups
}
