//! Human-readable rendering of classified filings.

use std::io::{self, Write};

use filingdesk_recon::model::{MatchResult, ReconSummary};
use filingdesk_recon::view::{category_counts, group_by_year, ViewFilter};

/// Grouped-by-year listing. Surfaced filings are starred.
pub fn write_grouped(out: &mut impl Write, results: &[MatchResult], filter: ViewFilter) -> io::Result<()> {
    let groups = group_by_year(results, filter);
    if groups.is_empty() {
        writeln!(out, "no filings match filter '{filter}'")?;
        return Ok(());
    }

    for group in groups {
        writeln!(out, "{}  ({}/{} tracked)", group.year, group.tracked, group.total)?;
        for r in group.results {
            let marker = if r.surfaced { '*' } else { ' ' };
            writeln!(
                out,
                " {marker} {:<11} {:<10} {:<10}  {}  {}",
                format!("[{}]", r.status),
                r.filing.form_type,
                r.filing.filing_date,
                r.filing.accession_id,
                r.filing.description,
            )?;
            for fact in r.cross_refs.iter().flatten() {
                writeln!(out, "      {}: {}", fact.source_label, fact.captured_fact)?;
            }
        }
    }
    Ok(())
}

/// `annual 1 · current 2 · ...`, non-zero categories only.
pub fn category_line(results: &[MatchResult]) -> String {
    category_counts(results)
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .map(|(c, n)| format!("{} {n}", c.slug()))
        .collect::<Vec<_>>()
        .join(" · ")
}

pub fn summary_line(subject: &str, s: &ReconSummary) -> String {
    let mut line = format!(
        "{subject}: {} filings — {} tracked, {} data only, {} new",
        s.total, s.tracked, s.data_only, s.new
    );
    if s.surfaced > 0 {
        line.push_str(&format!(", {} surfaced since last load", s.surfaced));
    }
    line
}
