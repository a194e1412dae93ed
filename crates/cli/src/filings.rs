//! `fdesk filings`: live session against the feed service.

use std::io;
use std::time::Duration;

use chrono::Utc;
use filingdesk_feed_client::FeedClient;
use filingdesk_recon::evidence::compute_summary;
use filingdesk_recon::view::filter_results;
use filingdesk_recon::{KvStore, LoadOrigin, MatchResult, ReconSession, RefreshOutcome, ReconSummary, ViewFilter};
use serde::Serialize;

use crate::display;
use crate::exit_codes::{EXIT_ERROR, EXIT_RECON_UNTRACKED};
use crate::host::Host;
use crate::CliError;

pub struct FilingsArgs {
    pub subject: String,
    pub refresh: bool,
    pub watch: Option<u64>,
    pub cycles: Option<u32>,
    pub filter: String,
    pub json: bool,
    pub strict: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FilingsReport<'a> {
    subject: &'a str,
    origin: LoadOrigin,
    fetched_at: String,
    knowledge_refreshed: bool,
    filter: String,
    summary: ReconSummary,
    novel: &'a [String],
    results: Vec<&'a MatchResult>,
}

pub fn cmd_filings(args: FilingsArgs) -> Result<(), CliError> {
    let filter = args.filter.parse::<ViewFilter>().map_err(CliError::args)?;
    if args.watch == Some(0) {
        return Err(CliError::args("--watch interval must be at least 1 second"));
    }

    let host = Host::load();
    let client = host.client()?;
    let mut session = host.session(&args.subject)?;

    let now = Utc::now();
    let loaded = if args.refresh {
        session.refresh(&client, &client, now)
    } else {
        session.load(&client, &client, now)
    };
    let mut outcome = loaded.map_err(CliError::recon)?;

    if outcome.origin == LoadOrigin::Cache {
        // Replay restores filings only; records still come from the service.
        if session.refresh_knowledge(&client) {
            outcome.results = session.results();
            outcome.knowledge_refreshed = true;
        }
    }

    // Watch mode emits one compact report per line.
    let compact = args.watch.is_some();
    emit(&session, &outcome, filter, args.json, compact, false)?;

    if let Some(secs) = args.watch {
        outcome = watch(&mut session, &client, outcome, secs, args.cycles, filter, args.json)?;
    }

    let summary = compute_summary(&outcome.results);
    if args.strict && summary.new > 0 {
        return Err(CliError {
            code: EXIT_RECON_UNTRACKED,
            message: format!("{} untracked filing(s) for {}", summary.new, session.subject()),
            hint: None,
        });
    }
    Ok(())
}

/// Refresh every `secs` seconds. A failed refresh is reported and the loop
/// keeps the last good outcome.
fn watch<S: KvStore>(
    session: &mut ReconSession<S>,
    client: &FeedClient,
    mut last: RefreshOutcome,
    secs: u64,
    cycles: Option<u32>,
    filter: ViewFilter,
    json: bool,
) -> Result<RefreshOutcome, CliError> {
    let mut cycle = 0u32;
    while cycles.map_or(true, |max| cycle < max) {
        std::thread::sleep(Duration::from_secs(secs));
        cycle += 1;

        match session.refresh(client, client, Utc::now()) {
            Ok(outcome) => {
                emit(session, &outcome, filter, json, true, true)?;
                last = outcome;
            }
            Err(e) => {
                log::warn!("watch cycle {cycle}: {e}");
                eprintln!("refresh failed: {e}");
            }
        }
    }
    Ok(last)
}

fn emit<S: KvStore>(
    session: &ReconSession<S>,
    outcome: &RefreshOutcome,
    filter: ViewFilter,
    json: bool,
    compact: bool,
    surfaced_only: bool,
) -> Result<(), CliError> {
    let summary = compute_summary(&outcome.results);

    if json {
        let results = filter_results(&outcome.results, filter)
            .into_iter()
            .filter(|r| !surfaced_only || r.surfaced)
            .collect();
        let report = FilingsReport {
            subject: session.subject(),
            origin: outcome.origin,
            fetched_at: outcome.fetched_at.to_rfc3339(),
            knowledge_refreshed: outcome.knowledge_refreshed,
            filter: filter.to_string(),
            summary,
            novel: &outcome.novel,
            results,
        };
        let out = if compact {
            serde_json::to_string(&report)
        } else {
            serde_json::to_string_pretty(&report)
        }
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    let write_err = |e: io::Error| CliError {
        code: EXIT_ERROR,
        message: format!("cannot write listing: {e}"),
        hint: None,
    };

    if surfaced_only {
        let surfaced: Vec<MatchResult> = outcome.results.iter().filter(|r| r.surfaced).cloned().collect();
        if surfaced.is_empty() {
            eprintln!("{}: no new filings", session.subject());
            return Ok(());
        }
        display::write_grouped(&mut io::stdout().lock(), &surfaced, filter).map_err(write_err)?;
    } else {
        display::write_grouped(&mut io::stdout().lock(), &outcome.results, filter).map_err(write_err)?;
    }

    eprintln!("{}", display::summary_line(session.subject(), &summary));
    match outcome.origin {
        LoadOrigin::Cache => eprintln!("from cache (fetched {})", outcome.fetched_at.to_rfc3339()),
        LoadOrigin::Feed if !outcome.knowledge_refreshed => {
            eprintln!("knowledge refresh failed; records may be stale")
        }
        LoadOrigin::Feed => {}
    }
    Ok(())
}
