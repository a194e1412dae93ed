//! `fdesk login` / `fdesk logout`: local feed service credentials.

use std::io::{self, Write};

use filingdesk_feed_client::{delete_auth, save_auth, AuthCredentials};

use crate::exit_codes::{EXIT_ERROR, EXIT_USAGE};
use crate::host::Host;
use crate::CliError;

pub fn cmd_login(token: Option<String>, api_base: Option<String>) -> Result<(), CliError> {
    // --token flag (or FILINGDESK_TOKEN via clap) > interactive prompt
    let token = match token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
        Some(t) => t,
        None if atty::is(atty::Stream::Stdin) => {
            eprint!("Feed API token: ");
            io::stderr().flush().ok();
            let mut buf = String::new();
            io::stdin()
                .read_line(&mut buf)
                .map_err(|e| CliError { code: EXIT_ERROR, message: e.to_string(), hint: None })?;
            let trimmed = buf.trim().to_string();
            if trimmed.is_empty() {
                return Err(CliError {
                    code: EXIT_USAGE,
                    message: "No token provided".into(),
                    hint: Some("pass --token or set FILINGDESK_TOKEN".into()),
                });
            }
            trimmed
        }
        None => {
            return Err(CliError {
                code: EXIT_USAGE,
                message: "No token provided and stdin is not a TTY".into(),
                hint: Some("pass --token or set FILINGDESK_TOKEN".into()),
            });
        }
    };

    let api_base = match api_base {
        Some(base) => base.trim().trim_end_matches('/').to_string(),
        None => Host::load().settings.effective_api_base(),
    };
    if !api_base.starts_with("http://") && !api_base.starts_with("https://") {
        return Err(CliError::args(format!("invalid --api-base: {api_base}"))
            .with_hint("expected an http:// or https:// URL"));
    }

    let creds = AuthCredentials::new(token, api_base.clone());
    let path = save_auth(&creds).map_err(CliError::general)?;

    eprintln!("Saved credentials for {} to {}", api_base, path.display());
    Ok(())
}

pub fn cmd_logout() -> Result<(), CliError> {
    match delete_auth().map_err(CliError::general)? {
        true => eprintln!("Logged out"),
        false => eprintln!("Not logged in"),
    }
    Ok(())
}
