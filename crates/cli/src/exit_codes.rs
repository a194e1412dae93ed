//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 3-9     | recon            | Reconciliation outcome and input codes   |
//! | 50-59   | feed             | Feed service and credentials             |
//! | 60-69   | patch            | Patch preview/commit workflow            |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use filingdesk_feed_client::ClientError;
use filingdesk_recon::{FetchError, ReconError};

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Recon (3-9)
// =============================================================================

/// Untracked (`new`) filings present and `--strict` / `fail_on_new` is set.
pub const EXIT_RECON_UNTRACKED: u8 = 3;

/// Config file failed to parse or validate.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 4;

/// Runtime error (cannot read input, bad JSON, cannot write output).
pub const EXIT_RECON_RUNTIME: u8 = 5;

// =============================================================================
// Feed (50-59)
// =============================================================================

/// Operation needs credentials and none are saved.
pub const EXIT_FEED_NOT_AUTH: u8 = 50;

/// Feed service rejected the credentials (401/403).
pub const EXIT_FEED_AUTH: u8 = 51;

/// Feed service rejected the request (400/422).
pub const EXIT_FEED_VALIDATION: u8 = 52;

/// Feed service unreachable or answered with an error status.
pub const EXIT_FEED_UNAVAILABLE: u8 = 53;

/// Feed service answered with a body we cannot decode.
pub const EXIT_FEED_PARSE: u8 = 54;

// =============================================================================
// Patch (60-69)
// =============================================================================

/// Patch preview reports invalid files; nothing may be committed.
pub const EXIT_PATCH_INVALID: u8 = 60;

/// Saved preview contains no patches.
pub const EXIT_PATCH_EMPTY: u8 = 61;

// =============================================================================
// Mapping helpers
// =============================================================================

/// Exit code for a direct feed-service call.
pub fn client_exit_code(err: &ClientError) -> u8 {
    match err {
        ClientError::NotAuthenticated => EXIT_FEED_NOT_AUTH,
        ClientError::AuthRejected(..) => EXIT_FEED_AUTH,
        ClientError::Validation(_) => EXIT_FEED_VALIDATION,
        ClientError::Network(_) | ClientError::Http(..) => EXIT_FEED_UNAVAILABLE,
        ClientError::Parse(_) => EXIT_FEED_PARSE,
    }
}

/// Exit code for a feed failure that came back through the engine.
pub fn fetch_exit_code(err: &FetchError) -> u8 {
    match err.status {
        Some(401) | Some(403) => EXIT_FEED_AUTH,
        Some(400) | Some(422) => EXIT_FEED_VALIDATION,
        _ => EXIT_FEED_UNAVAILABLE,
    }
}

pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_RECON_INVALID_CONFIG,
        ReconError::Feed { source, .. } => fetch_exit_code(source),
        ReconError::InputParse { .. } | ReconError::Io(_) => EXIT_RECON_RUNTIME,
    }
}
