//! `fdesk recon`: offline reconciliation from a TOML config and JSON inputs.

use std::io;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use filingdesk_recon::engine::{load_cross_refs_json, load_filings_json, load_records_json};
use filingdesk_recon::{
    CrossReferenceIndex, KnowledgeBase, ReconConfig, ReconInput, ViewFilter,
};

use crate::display;
use crate::exit_codes::{EXIT_RECON_INVALID_CONFIG, EXIT_RECON_RUNTIME, EXIT_RECON_UNTRACKED};
use crate::CliError;

#[derive(Subcommand)]
pub enum ReconCommands {
    /// Run reconciliation from a TOML config file
    #[command(after_help = "\
Examples:
  fdesk recon run acme.recon.toml
  fdesk recon run acme.recon.toml --json
  fdesk recon run acme.recon.toml --output result.json
  fdesk recon run acme.recon.toml --filter new --strict")]
    Run {
        /// Path to the .recon.toml config file
        config: PathBuf,

        /// Output JSON to stdout instead of the grouped listing
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Override the config's view filter for the listing
        #[arg(long)]
        filter: Option<String>,

        /// Exit 3 when any filing is untracked, even without fail_on_new
        #[arg(long)]
        strict: bool,
    },

    /// Validate a recon config without running
    #[command(after_help = "\
Examples:
  fdesk recon validate acme.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },
}

pub fn cmd_recon(cmd: ReconCommands) -> Result<(), CliError> {
    match cmd {
        ReconCommands::Run { config, json, output, filter, strict } => {
            cmd_recon_run(config, json, output, filter, strict)
        }
        ReconCommands::Validate { config } => cmd_recon_validate(config),
    }
}

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

fn load_config(config_path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("cannot read config: {e}")))?;
    ReconConfig::from_toml(&config_str)
        .map_err(|e| recon_err(EXIT_RECON_INVALID_CONFIG, e.to_string()))
}

fn read_input(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path)
        .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("cannot read {}: {e}", path.display())))
}

/// Input paths resolve relative to the config file's directory.
fn load_input(config_path: &Path, config: &ReconConfig) -> Result<ReconInput, CliError> {
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let filings = load_filings_json(&read_input(&base_dir.join(&config.inputs.filings))?)
        .map_err(|e| recon_err(EXIT_RECON_RUNTIME, e.to_string()))?;
    let records = load_records_json(&read_input(&base_dir.join(&config.inputs.records))?)
        .map_err(|e| recon_err(EXIT_RECON_RUNTIME, e.to_string()))?;
    let cross_refs = match &config.inputs.cross_refs {
        Some(file) => load_cross_refs_json(&read_input(&base_dir.join(file))?)
            .map_err(|e| recon_err(EXIT_RECON_RUNTIME, e.to_string()))?,
        None => CrossReferenceIndex::default(),
    };

    Ok(ReconInput {
        filings,
        knowledge: KnowledgeBase { records, cross_refs },
    })
}

fn cmd_recon_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    filter: Option<String>,
    strict: bool,
) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let filter: ViewFilter = match filter {
        Some(f) => f.parse::<ViewFilter>().map_err(CliError::args)?,
        None => config
            .view_filter()
            .map_err(|e| recon_err(EXIT_RECON_INVALID_CONFIG, e.to_string()))?,
    };

    let input = load_input(&config_path, &config)?;

    let result = filingdesk_recon::run(&config, &input).map_err(CliError::recon)?;

    let json_str = serde_json::to_string_pretty(&result)
        .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    } else {
        display::write_grouped(&mut io::stdout().lock(), &result.results, filter)
            .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("cannot write listing: {e}")))?;
    }

    // Human summary to stderr
    eprintln!("{}", display::summary_line(&result.meta.subject, &result.summary));
    let categories = display::category_line(&result.results);
    if !categories.is_empty() {
        eprintln!("{categories}");
    }

    if result.summary.new > 0 && (strict || config.fail_on_new) {
        return Err(recon_err(
            EXIT_RECON_UNTRACKED,
            format!("{} untracked filing(s)", result.summary.new),
        ));
    }

    Ok(())
}

fn cmd_recon_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;

    eprintln!("valid: {} (subject {})", config.name, config.subject);
    eprintln!("  filings:    {}", config.inputs.filings);
    eprintln!("  records:    {}", config.inputs.records);
    if let Some(ref cross_refs) = config.inputs.cross_refs {
        eprintln!("  cross_refs: {cross_refs}");
    }
    eprintln!("  view:       {}", config.view.filter);
    if config.fail_on_new {
        eprintln!("  fail_on_new: true");
    }
    Ok(())
}
