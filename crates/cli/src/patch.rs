//! `fdesk patch`: two-phase knowledge-base patch workflow.
//!
//! `preview` asks the service for a dry run derived from a filing's
//! analysis and can save it; `commit` sends a saved preview's patches back
//! verbatim. Previews with invalid files are never committed.

use std::path::PathBuf;

use clap::Subcommand;
use filingdesk_feed_client::PatchPreview;
use filingdesk_recon::normalize::normalize_accession;
use serde::{Deserialize, Serialize};

use crate::analyze::narrative_for;
use crate::exit_codes::{EXIT_PATCH_EMPTY, EXIT_PATCH_INVALID, EXIT_USAGE};
use crate::host::{io_error, Host};
use crate::CliError;

#[derive(Subcommand)]
pub enum PatchCommands {
    /// Dry-run the patches derived from a filing's analysis
    #[command(after_help = "\
Examples:
  fdesk patch preview ACME 0000111-25-000005
  fdesk patch preview ACME 0000111-25-000005 --save acme.patch.json
  fdesk patch preview ACME 000011125000005 --json")]
    Preview {
        /// Subject identifier
        subject: String,

        /// Accession number of the analysed filing
        accession: String,

        /// Save the preview for a later `fdesk patch commit`
        #[arg(long, value_name = "FILE")]
        save: Option<PathBuf>,

        /// Output the preview as JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Commit a saved preview
    #[command(after_help = "\
Examples:
  fdesk patch commit acme.patch.json")]
    Commit {
        /// File written by `fdesk patch preview --save`
        file: PathBuf,
    },
}

/// Preview as written by `--save`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPatch {
    pub subject: String,
    pub accession_id: String,
    pub preview: PatchPreview,
}

pub fn cmd_patch(cmd: PatchCommands) -> Result<(), CliError> {
    match cmd {
        PatchCommands::Preview { subject, accession, save, json } => {
            cmd_patch_preview(&subject, &accession, save, json)
        }
        PatchCommands::Commit { file } => cmd_patch_commit(file),
    }
}

fn patch_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

fn invalid_files_error(preview: &PatchPreview) -> Option<CliError> {
    let invalid: Vec<String> = preview
        .invalid_files()
        .map(|f| match &f.error {
            Some(err) => format!("{} ({err})", f.path),
            None => f.path.clone(),
        })
        .collect();
    if invalid.is_empty() {
        return None;
    }
    Some(
        patch_err(EXIT_PATCH_INVALID, format!("preview has invalid files: {}", invalid.join(", ")))
            .with_hint("re-run the analysis with --discard, then preview again"),
    )
}

fn print_preview(preview: &PatchPreview) {
    println!("{} change(s)", preview.change_count);
    for file in &preview.files {
        let mark = if file.valid { "ok " } else { "BAD" };
        match &file.error {
            Some(err) => println!("  [{mark}] {}: {err}", file.path),
            None => println!("  [{mark}] {}", file.path),
        }
    }
    if !preview.diff.trim().is_empty() {
        println!();
        println!("{}", preview.diff.trim_end());
    }
}

fn cmd_patch_preview(
    subject: &str,
    accession: &str,
    save: Option<PathBuf>,
    json: bool,
) -> Result<(), CliError> {
    let host = Host::load();
    let client = host.client()?;

    let narrative = narrative_for(&host, &client, subject, accession, false)?;
    let preview = client
        .preview_patch(subject, &narrative.text)
        .map_err(CliError::client)?;

    if json {
        let out = serde_json::to_string_pretty(&preview)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{out}");
    } else {
        print_preview(&preview);
    }

    if let Some(err) = invalid_files_error(&preview) {
        return Err(err);
    }

    if let Some(path) = save {
        let saved = SavedPatch {
            subject: subject.trim().to_string(),
            accession_id: normalize_accession(accession),
            preview,
        };
        let contents = serde_json::to_string_pretty(&saved)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        std::fs::write(&path, contents).map_err(|e| io_error(path.display(), e))?;
        eprintln!("saved preview to {}", path.display());
        eprintln!("commit with: fdesk patch commit {}", path.display());
    }
    Ok(())
}

fn cmd_patch_commit(file: PathBuf) -> Result<(), CliError> {
    let contents = std::fs::read_to_string(&file).map_err(|e| io_error(file.display(), e))?;
    let saved: SavedPatch = serde_json::from_str(&contents).map_err(|e| {
        patch_err(EXIT_USAGE, format!("{} is not a saved patch preview: {e}", file.display()))
            .with_hint("create one with `fdesk patch preview SUBJECT ACCESSION --save FILE`")
    })?;

    if let Some(err) = invalid_files_error(&saved.preview) {
        return Err(err);
    }
    if saved.preview.patches.is_empty() {
        return Err(patch_err(EXIT_PATCH_EMPTY, "nothing to commit: preview contains no patches"));
    }

    let host = Host::load();
    let client = host.client()?;
    let summary = client
        .commit_patch(&saved.subject, &saved.preview.patches)
        .map_err(CliError::client)?;

    println!("{summary}");
    eprintln!(
        "committed {} patch(es) for {} {}",
        saved.preview.patches.len(),
        saved.subject,
        saved.accession_id
    );
    Ok(())
}
