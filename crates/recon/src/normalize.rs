//! Canonical forms for accession numbers, form-type labels and dates.
//!
//! Every function here is total: dirty input degrades to a value that
//! simply fails to compare equal downstream, never to an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

const ISO_FORMAT: &str = "%Y-%m-%d";

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static regex"));

/// `"February 3-5, 2026"`, `"Feb 3 – 5 2026"`.
static DAY_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z]+)\.?\s+(\d{1,2})\s*[-–]\s*\d{1,2},?\s+(\d{4})$").expect("static regex")
});

const DATE_FORMATS: &[&str] = &[
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%Y.%m.%d",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

/// Width of the year and sequence parts of a `filer-YY-sequence` accession.
const ACCESSION_YEAR_WIDTH: usize = 2;
const ACCESSION_SEQUENCE_WIDTH: usize = 6;

/// Strip every separator from an accession number. Digits and letters are
/// kept as-is, so dashed and undashed spellings collapse to one key.
///
/// A separated three-part numeric id (`0000111-25-5`) has its year and
/// sequence parts zero-padded first, so a shortened legacy spelling
/// collapses onto the full one (`000011125000005`).
pub fn normalize_accession(id: &str) -> String {
    let parts: Vec<&str> = id
        .split(|c: char| !c.is_alphanumeric())
        .filter(|p| !p.is_empty())
        .collect();

    match parts.as_slice() {
        [filer, year, sequence] if parts.iter().all(|p| p.bytes().all(|b| b.is_ascii_digit())) => {
            format!(
                "{filer}{year:0>yw$}{sequence:0>sw$}",
                yw = ACCESSION_YEAR_WIDTH,
                sw = ACCESSION_SEQUENCE_WIDTH
            )
        }
        _ => parts.concat(),
    }
}

/// Canonical form-type label: `"Form 4"` → `"4"`, `"SCHEDULE 13D/A"` → `"SC13DA"`.
pub fn normalize_form(label: &str) -> String {
    let compact: String = label
        .to_uppercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '/')
        .collect();

    let mut rest = compact.as_str();
    while let Some(stripped) = rest.strip_prefix("FORM") {
        rest = stripped;
    }
    let mut out = rest.to_string();
    while let Some(tail) = out.strip_prefix("SCHEDULE") {
        out = format!("SC{tail}");
    }
    out
}

/// Best-effort conversion to `YYYY-MM-DD`. Returns the input unchanged when
/// nothing parses.
pub fn normalize_date(text: &str) -> String {
    let trimmed = text.trim();
    if ISO_DATE.is_match(trimmed) {
        return trimmed.to_string();
    }

    if let Some(start) = parse_range_start(trimmed) {
        return start.format(ISO_FORMAT).to_string();
    }

    match parse_general(trimmed) {
        Some(date) => date.format(ISO_FORMAT).to_string(),
        None => text.to_string(),
    }
}

/// The day before, the day itself and the day after. Unparseable input
/// yields a single-element window holding the input.
pub fn date_neighbors(iso_date: &str) -> Vec<String> {
    let Ok(date) = NaiveDate::parse_from_str(iso_date, ISO_FORMAT) else {
        return vec![iso_date.to_string()];
    };
    [date.pred_opt(), Some(date), date.succ_opt()]
        .into_iter()
        .flatten()
        .map(|d| d.format(ISO_FORMAT).to_string())
        .collect()
}

fn parse_range_start(text: &str) -> Option<NaiveDate> {
    let caps = DAY_RANGE.captures(text)?;
    let candidate = format!("{} {} {}", &caps[1], &caps[2], &caps[3]);
    NaiveDate::parse_from_str(&candidate, "%B %d %Y").ok()
}

fn parse_general(text: &str) -> Option<NaiveDate> {
    // "Feb. 3, 2026" → "Feb 3, 2026"
    let cleaned = text.replace(". ", " ");

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, fmt) {
            return Some(date);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(&cleaned) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&cleaned, fmt) {
            return Some(dt.date());
        }
    }
    None
}
