//! `fdesk analyze`: narrative analysis through the narrative cache.

use filingdesk_feed_client::{AnalysisRequest, FeedClient};
use filingdesk_recon::normalize::normalize_accession;
use filingdesk_recon::ExternalFiling;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::host::Host;
use crate::CliError;

static VERDICT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[VERDICT:\s*([^\]]+?)\s*\]\s*[—–-]+\s*([^\n]*)").expect("static regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub level: String,
    pub explanation: String,
}

/// First `[VERDICT: level] — explanation` marker in the text, if any.
pub fn parse_verdict(analysis: &str) -> Option<Verdict> {
    let caps = VERDICT.captures(analysis)?;
    Some(Verdict {
        level: caps[1].trim().to_lowercase(),
        explanation: caps[2].trim().to_string(),
    })
}

/// Analysis text for one filing plus whether it came from the cache.
pub struct Narrative {
    pub text: String,
    pub cached: bool,
}

/// Cached analysis when present (unless `discard`), otherwise a fresh one
/// from the service, which is then cached.
pub fn narrative_for(
    host: &Host,
    client: &FeedClient,
    subject: &str,
    accession: &str,
    discard: bool,
) -> Result<Narrative, CliError> {
    let mut cache = host.narrative_cache();
    if discard {
        cache.remove(subject, accession);
    } else if let Some(text) = cache.get(subject, accession) {
        log::debug!("narrative cache hit for {subject} {accession}");
        return Ok(Narrative { text, cached: true });
    }

    let filing = find_filing(host, client, subject, accession)?;
    let text = client
        .analyze(&AnalysisRequest::from(&filing))
        .map_err(CliError::client)?;
    cache.set(subject, accession, text.clone());
    Ok(Narrative { text, cached: false })
}

/// Look the filing up in the feed for `subject`: the feed cache when it is
/// fresh, otherwise a feed fetch (which refills the cache). Internal
/// records are not needed here and are never fetched.
fn find_filing(
    host: &Host,
    client: &FeedClient,
    subject: &str,
    accession: &str,
) -> Result<ExternalFiling, CliError> {
    let subject = subject.trim();
    if subject.is_empty() {
        return Err(CliError::args("subject must not be empty"));
    }

    let mut feed_cache = host.feed_cache();
    let filings = match feed_cache.get(subject) {
        Some(cached) => cached.filings,
        None => {
            let filings = client.get_filings(subject).map_err(CliError::client)?;
            feed_cache.put(subject, &filings);
            filings
        }
    };

    let wanted = normalize_accession(accession);
    filings
        .into_iter()
        .find(|f| normalize_accession(&f.accession_id) == wanted)
        .ok_or_else(|| {
            CliError::args(format!("no filing {accession} in the feed for {subject}"))
                .with_hint(format!("run `fdesk filings {subject} --refresh` to reload the feed"))
        })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeReport<'a> {
    subject: &'a str,
    accession_id: String,
    cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    verdict: Option<Verdict>,
    analysis: &'a str,
}

pub fn cmd_analyze(subject: &str, accession: &str, discard: bool, json: bool) -> Result<(), CliError> {
    if normalize_accession(accession).is_empty() {
        return Err(CliError::args("accession number must not be empty"));
    }

    let host = Host::load();
    let client = host.client()?;
    let narrative = narrative_for(&host, &client, subject, accession, discard)?;
    let verdict = parse_verdict(&narrative.text);

    if json {
        let report = AnalyzeReport {
            subject: subject.trim(),
            accession_id: normalize_accession(accession),
            cached: narrative.cached,
            verdict,
            analysis: &narrative.text,
        };
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    if let Some(v) = &verdict {
        println!("verdict: {} ({})", v.level, v.explanation);
        println!();
    }
    println!("{}", narrative.text.trim_end());
    if narrative.cached {
        eprintln!("(cached analysis; pass --discard to request a fresh one)");
    }
    Ok(())
}
