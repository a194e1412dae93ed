//! Filing feed API client: shared by every host of the engine.
//!
//! This crate is the single source of truth for the feed service wire
//! contract: filings, knowledge base, narrative analysis, patch
//! preview/commit, and local credentials.
//!
//! No retries. No caching (the engine owns that). No async runtime.

mod auth;
mod client;

pub use auth::{
    auth_file_path, delete_auth, delete_auth_at, load_auth, load_auth_from, save_auth,
    save_auth_to, AuthCredentials,
};
pub use client::{
    AnalysisRequest, ClientError, FeedClient, PatchFile, PatchPreview, DEFAULT_TIMEOUT,
};
