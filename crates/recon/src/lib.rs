//! `filingdesk-recon`: filing reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded filings and knowledge records,
//! returns classified results. Feed access and storage come in through the
//! [`FilingFeed`], [`RecordSource`] and [`KvStore`] traits; no IO here.

pub mod cache;
pub mod config;
pub mod crossref;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod novelty;
pub mod session;
pub mod view;

pub use cache::{FeedCache, KvStore, MemoryStore, NarrativeCache};
pub use config::ReconConfig;
pub use crossref::CrossReferenceIndex;
pub use engine::run;
pub use error::{FetchError, ReconError, StoreError};
pub use matcher::reconcile;
pub use model::{
    CapturedFact, ExternalFiling, InternalRecord, KnowledgeBase, MatchResult, MatchStatus,
    ReconInput, ReconResult, ReconSummary,
};
pub use novelty::NoveltyTracker;
pub use session::{FilingFeed, LoadOrigin, ReconSession, RecordSource, RefreshOutcome};
pub use view::{FormCategory, ViewFilter};
