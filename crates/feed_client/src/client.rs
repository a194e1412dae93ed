//! Feed service HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required). Every call is one
//! request; failures come back as [`ClientError`] and convert into the
//! engine's [`FetchError`] at the source-trait boundary.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use filingdesk_recon::cache::subject_key;
use filingdesk_recon::{ExternalFiling, FetchError, FilingFeed, KnowledgeBase, RecordSource};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Feed service client (blocking).
#[derive(Clone)]
pub struct FeedClient {
    http: reqwest::blocking::Client,
    api_base: String,
    token: Option<String>,
}

/// Error type for feed service operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Operation needs credentials and none are configured
    NotAuthenticated,
    /// Server rejected the credentials (401/403)
    AuthRejected(u16, String),
    /// Network error
    Network(String),
    /// HTTP error with status code
    Http(u16, String),
    /// JSON parsing error
    Parse(String),
    /// Server returned a validation error (400/422 with message)
    Validation(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::NotAuthenticated => write!(f, "Not authenticated — run `fdesk login` first"),
            ClientError::AuthRejected(code, msg) => write!(f, "Credentials rejected ({}): {}", code, msg),
            ClientError::Network(msg) => write!(f, "Network error: {}", msg),
            ClientError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            ClientError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ClientError::Validation(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl ClientError {
    /// HTTP status behind the error, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http(code, _) | ClientError::AuthRejected(code, _) => Some(*code),
            _ => None,
        }
    }
}

impl From<ClientError> for FetchError {
    fn from(err: ClientError) -> Self {
        match err.status() {
            Some(status) => FetchError::with_status(err.to_string(), status),
            None => FetchError::new(err.to_string()),
        }
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Deserialize)]
struct FilingsResponse {
    filings: Vec<ExternalFiling>,
}

/// Input to the narrative analysis service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub document_url: String,
    pub form_type: String,
    pub description: String,
    pub filing_date: String,
}

impl From<&ExternalFiling> for AnalysisRequest {
    fn from(filing: &ExternalFiling) -> Self {
        Self {
            document_url: filing.document_url.clone(),
            form_type: filing.form_type.clone(),
            description: filing.description.clone(),
            filing_date: filing.filing_date.clone(),
        }
    }
}

#[derive(Deserialize)]
struct AnalysisResponse {
    analysis: String,
}

/// Dry-run result of the patch workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchPreview {
    pub change_count: u64,
    #[serde(default)]
    pub files: Vec<PatchFile>,
    #[serde(default)]
    pub diff: String,
    /// Opaque patch set, sent back verbatim on commit.
    #[serde(default)]
    pub patches: Vec<serde_json::Value>,
}

impl PatchPreview {
    pub fn invalid_files(&self) -> impl Iterator<Item = &PatchFile> {
        self.files.iter().filter(|f| !f.valid)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchFile {
    pub path: String,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Deserialize)]
struct CommitResponse {
    summary: String,
}

impl FeedClient {
    /// Create an anonymous client for `api_base`.
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("fdesk/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Send requests with bearer auth.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Current filing feed for `subject`.
    pub fn get_filings(&self, subject: &str) -> Result<Vec<ExternalFiling>, ClientError> {
        let url = self.endpoint(&["api", "filings", &subject_key(subject)])?;
        let body: FilingsResponse = self.get(url)?;
        log::info!("feed: {} filings for {}", body.filings.len(), subject_key(subject));
        Ok(body.filings)
    }

    /// Internal records and cross-reference index for `subject`.
    pub fn get_knowledge(&self, subject: &str) -> Result<KnowledgeBase, ClientError> {
        let url = self.endpoint(&["api", "knowledge", &subject_key(subject)])?;
        let knowledge: KnowledgeBase = self.get(url)?;
        log::info!(
            "knowledge: {} records, {} cross-refs for {}",
            knowledge.records.len(),
            knowledge.cross_refs.len(),
            subject_key(subject)
        );
        Ok(knowledge)
    }

    /// Narrative analysis text for one filing.
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<String, ClientError> {
        let url = self.endpoint(&["api", "analysis"])?;
        let body: AnalysisResponse = self.post_json(url, request)?;
        Ok(body.analysis)
    }

    /// Patch workflow, phase one: dry run.
    pub fn preview_patch(&self, subject: &str, analysis: &str) -> Result<PatchPreview, ClientError> {
        let url = self.endpoint(&["api", "patches", "preview"])?;
        self.post_json(
            url,
            &serde_json::json!({
                "subject": subject_key(subject),
                "analysis": analysis,
                "dryRun": true,
            }),
        )
    }

    /// Patch workflow, phase two: apply a previewed patch set. Requires
    /// credentials.
    pub fn commit_patch(&self, subject: &str, patches: &[serde_json::Value]) -> Result<String, ClientError> {
        if self.token.is_none() {
            return Err(ClientError::NotAuthenticated);
        }
        let url = self.endpoint(&["api", "patches", "commit"])?;
        let body: CommitResponse = self.post_json(
            url,
            &serde_json::json!({
                "subject": subject_key(subject),
                "patches": patches,
                "dryRun": false,
            }),
        )?;
        Ok(body.summary)
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, ClientError> {
        let mut url = reqwest::Url::parse(&self.api_base)
            .map_err(|e| ClientError::Network(format!("invalid API base '{}': {e}", self.api_base)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Network(format!("invalid API base '{}'", self.api_base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get<T: DeserializeOwned>(&self, url: reqwest::Url) -> Result<T, ClientError> {
        log::debug!("GET {url}");
        let mut req = self.http.get(url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let response = req.send().map_err(|e| ClientError::Network(e.to_string()))?;
        decode(check_status(response)?)
    }

    fn post_json<B, T>(&self, url: reqwest::Url, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        log::debug!("POST {url}");
        let mut req = self.http.post(url).json(body);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let response = req.send().map_err(|e| ClientError::Network(e.to_string()))?;
        decode(check_status(response)?)
    }
}

fn check_status(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, ClientError> {
    let status = response.status().as_u16();
    if response.status().is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    match status {
        400 | 422 => Err(ClientError::Validation(body)),
        401 | 403 => Err(ClientError::AuthRejected(status, body)),
        _ => Err(ClientError::Http(status, body)),
    }
}

fn decode<T: DeserializeOwned>(response: reqwest::blocking::Response) -> Result<T, ClientError> {
    let text = response.text().map_err(|e| ClientError::Network(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| ClientError::Parse(e.to_string()))
}

// ── Engine source traits ────────────────────────────────────────────

impl FilingFeed for FeedClient {
    fn fetch_filings(&self, subject: &str) -> Result<Vec<ExternalFiling>, FetchError> {
        Ok(self.get_filings(subject)?)
    }
}

impl RecordSource for FeedClient {
    fn fetch_knowledge(&self, subject: &str) -> Result<KnowledgeBase, FetchError> {
        Ok(self.get_knowledge(subject)?)
    }
}
