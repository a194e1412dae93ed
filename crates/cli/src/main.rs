// fdesk - filing reconciliation from the command line

mod analyze;
mod display;
mod exit_codes;
mod filings;
mod host;
mod login;
mod patch;
mod recon;
mod store;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{client_exit_code, recon_exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};
use filingdesk_feed_client::ClientError;
use filingdesk_recon::ReconError;

#[derive(Parser)]
#[command(name = "fdesk")]
#[command(about = "Reconcile regulatory filings against your own records")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Offline reconciliation from a TOML config and JSON inputs
    Recon {
        #[command(subcommand)]
        command: recon::ReconCommands,
    },

    /// Load, classify and list filings for a subject from the feed service
    #[command(after_help = "\
Examples:
  fdesk filings ACME
  fdesk filings ACME --refresh --filter new
  fdesk filings ACME --json
  fdesk filings ACME --watch 300
  fdesk filings ACME --watch 60 --cycles 5 --filter ownership")]
    Filings {
        /// Subject identifier (e.g. ticker)
        subject: String,

        /// Bypass the feed cache and fetch now
        #[arg(long)]
        refresh: bool,

        /// Keep refreshing every SECS seconds and report newly surfaced filings
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,

        /// Stop watching after N refreshes (requires --watch)
        #[arg(long, value_name = "N", requires = "watch")]
        cycles: Option<u32>,

        /// all, new, data_only, or a form category (annual, quarterly, current, ...)
        #[arg(long, default_value = "all")]
        filter: String,

        /// Output JSON to stdout instead of the grouped listing
        #[arg(long)]
        json: bool,

        /// Exit 3 when any filing is untracked
        #[arg(long)]
        strict: bool,
    },

    /// Ask the feed service for a narrative analysis of one filing
    #[command(after_help = "\
Examples:
  fdesk analyze ACME 0000111-25-000005
  fdesk analyze ACME 000011125000005 --json
  fdesk analyze ACME 0000111-25-000005 --discard")]
    Analyze {
        /// Subject identifier
        subject: String,

        /// Accession number of the filing (any separator style)
        accession: String,

        /// Drop the cached analysis and request a fresh one
        #[arg(long)]
        discard: bool,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Preview and commit knowledge-base patches derived from an analysis
    #[command(subcommand)]
    Patch(patch::PatchCommands),

    /// Save feed service credentials
    #[command(after_help = "\
Examples:
  fdesk login
  fdesk login --token fd_xxxxx
  FILINGDESK_TOKEN=fd_xxxxx fdesk login
  fdesk login --api-base https://feed.example.com")]
    Login {
        /// API token (omit to read FILINGDESK_TOKEN or prompt)
        #[arg(long, env = "FILINGDESK_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Feed service base URL to store with the token
        #[arg(long)]
        api_base: Option<String>,
    },

    /// Remove saved credentials
    Logout,

    /// Show the resolved configuration paths and feed endpoint
    Config {
        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  filingdesk-recon ", env!("CARGO_PKG_VERSION"),
    )
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Recon { command } => recon::cmd_recon(command),
        Commands::Filings { subject, refresh, watch, cycles, filter, json, strict } => {
            filings::cmd_filings(filings::FilingsArgs { subject, refresh, watch, cycles, filter, json, strict })
        }
        Commands::Analyze { subject, accession, discard, json } => {
            analyze::cmd_analyze(&subject, &accession, discard, json)
        }
        Commands::Patch(cmd) => patch::cmd_patch(cmd),
        Commands::Login { token, api_base } => login::cmd_login(token, api_base),
        Commands::Logout => login::cmd_logout(),
        Commands::Config { json } => cmd_config(json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Error from a direct feed-service call, with a hint where one helps.
    pub fn client(err: ClientError) -> Self {
        let hint = match &err {
            ClientError::NotAuthenticated => Some("run `fdesk login` to save a token".to_string()),
            ClientError::AuthRejected(..) => {
                Some("token expired or revoked; run `fdesk login` again".to_string())
            }
            ClientError::Network(_) => Some(format!(
                "is the feed service reachable? set {} to override the endpoint",
                filingdesk_config::API_BASE_ENV
            )),
            _ => None,
        };
        Self { code: client_exit_code(&err), message: err.to_string(), hint }
    }

    /// Error from the engine with its registry exit code.
    pub fn recon(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::Feed { .. } => Some("cached filings, if any, were left untouched".to_string()),
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// config
// ============================================================================

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigReport {
    config_file: String,
    auth_file: PathBuf,
    cache_dir: PathBuf,
    api_base: String,
    authenticated: bool,
    feed_ttl_minutes: i64,
    timeout_secs: u64,
}

fn cmd_config(json: bool) -> Result<(), CliError> {
    let host = host::Host::load();
    let report = ConfigReport {
        config_file: filingdesk_config::Settings::config_path_display(),
        auth_file: filingdesk_feed_client::auth_file_path(),
        cache_dir: host.cache_dir(),
        api_base: host.api_base(),
        authenticated: host.credentials.is_some(),
        feed_ttl_minutes: host.settings.effective_feed_ttl_minutes(),
        timeout_secs: host.settings.timeout_secs,
    };

    if json {
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    println!("config:    {}", report.config_file);
    println!("auth:      {}", report.auth_file.display());
    println!("cache:     {}", report.cache_dir.display());
    println!("api base:  {}", report.api_base);
    println!("logged in: {}", if report.authenticated { "yes" } else { "no" });
    println!("feed ttl:  {} min", report.feed_ttl_minutes);
    println!("timeout:   {} s", report.timeout_secs);
    Ok(())
}
