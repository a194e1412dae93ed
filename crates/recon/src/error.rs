use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (empty subject, missing inputs, bad filter).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Malformed filings / records / cross-reference JSON.
    #[error("{input}: cannot parse input: {message}")]
    InputParse { input: String, message: String },
    /// The filing feed could not be fetched. Nothing was reconciled.
    #[error("filing feed unavailable for '{subject}': {source}")]
    Feed {
        subject: String,
        #[source]
        source: FetchError,
    },
    /// IO error (file read, etc.).
    #[error("IO error: {0}")]
    Io(String),
}

/// Plain failure from an upstream source: a message plus the HTTP status
/// when the upstream answered at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}{}", status_suffix(.status))]
pub struct FetchError {
    pub message: String,
    pub status: Option<u16>,
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {code})"),
        None => String::new(),
    }
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), status: None }
    }

    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        Self { message: message.into(), status: Some(status) }
    }
}

/// Key-value store failure. Callers in this crate never surface it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store write failed: {0}")]
    Write(String),
}
