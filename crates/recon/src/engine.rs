use serde::de::DeserializeOwned;

use crate::config::ReconConfig;
use crate::crossref::CrossReferenceIndex;
use crate::error::ReconError;
use crate::evidence::compute_summary;
use crate::matcher::reconcile;
use crate::model::{ExternalFiling, InternalRecord, ReconInput, ReconMeta, ReconResult};

/// Run reconciliation per config. Returns classified results + summary.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconResult, ReconError> {
    config.validate()?;

    let results = reconcile(
        &input.filings,
        &input.knowledge.records,
        &input.knowledge.cross_refs,
    );
    let summary = compute_summary(&results);

    log::info!(
        "{}: {} filings, {} tracked, {} data only, {} new",
        config.subject,
        summary.total,
        summary.tracked,
        summary.data_only,
        summary.new
    );

    Ok(ReconResult {
        meta: ReconMeta {
            name: config.name.clone(),
            subject: config.subject.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        results,
    })
}

/// Accepts either a bare JSON array or an object wrapping it under `key`
/// (the feed API shape, e.g. `{"filings": [...]}`).
fn load_list<T: DeserializeOwned>(input: &str, json: &str, key: &str) -> Result<Vec<T>, ReconError> {
    let parse_err = |e: serde_json::Error| ReconError::InputParse {
        input: input.into(),
        message: e.to_string(),
    };

    let value: serde_json::Value = serde_json::from_str(json).map_err(parse_err)?;
    let list = match value {
        serde_json::Value::Object(mut obj) => obj.remove(key).ok_or_else(|| ReconError::InputParse {
            input: input.into(),
            message: format!("expected an array or an object with '{key}'"),
        })?,
        other => other,
    };
    serde_json::from_value(list).map_err(parse_err)
}

pub fn load_filings_json(json: &str) -> Result<Vec<ExternalFiling>, ReconError> {
    load_list("filings", json, "filings")
}

pub fn load_records_json(json: &str) -> Result<Vec<InternalRecord>, ReconError> {
    load_list("records", json, "records")
}

pub fn load_cross_refs_json(json: &str) -> Result<CrossReferenceIndex, ReconError> {
    serde_json::from_str(json).map_err(|e| ReconError::InputParse {
        input: "cross_refs".into(),
        message: e.to_string(),
    })
}
