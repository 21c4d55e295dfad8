// Rust guideline compliant 2026-08-01

//! Shared domain types and hexagonal ports for the SOCRATES alert-triage
//! pipeline.
//!
//! No other crate in the workspace is imported here. `receiver`, `module1`,
//! `module2`, and `module3` depend on this crate's traits alone; concrete
//! adapters (queues, search clients, LLM clients, HTTP tool clients) live in
//! the `socrates` binary crate.

mod alert;
mod envelope;
mod match_decision;
mod ports;
mod score;
mod verdict;

pub use alert::{AggregatedAlert, BucketState, NormalizedAlert, Snapshot};
pub use envelope::{AlertEnvelope, PathLookup, value_as_trimmed_string};
pub use match_decision::MatchDecision;
pub use ports::{
    AlertSource, AssetCatalog, AssetProfile, BusinessMatcherModel, ExternalTools, HistoryError, HistoryStore,
    INTERNAL_QUERY_TOOLS, InternalTools, LlmClient, ModelizerError, QueueError, QueueRead, QueueWrite,
    RawAlertFetcher, SearchHit, SourceError,
};
pub use score::{RiskLevel, ScoreBreakdown, round2, round4};
pub use verdict::{InvestigationVerdict, SEVERITIES, ToolCall, ToolResult, VERDICTS};
