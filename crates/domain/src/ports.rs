// Rust guideline compliant 2026-08-01

//! Hexagonal ports. Pipeline-logic crates (`receiver`, `module1`, `module2`,
//! `module3`) are generic over these traits; concrete adapters live only in
//! the `socrates` binary crate. One trait per seam, no `dyn` dispatch
//! needed since every adapter is resolved statically per binary.

use std::time::Duration;

use chrono::NaiveDate;
use serde_json::Value;

use crate::envelope::AlertEnvelope;
use crate::verdict::ToolResult;

// ---------------------------------------------------------------------------
// Queue primitive (§4.1)
// ---------------------------------------------------------------------------

/// Errors a queue adapter may return.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueueError {
    /// A popped payload was not valid JSON or not a JSON object.
    #[error("queue payload decode error: {0}")]
    Decode(String),
    /// The queue has been closed; no further operations are accepted.
    #[error("queue closed")]
    Closed,
}

/// Write side of a named FIFO queue. `maxlen` trimming (if configured) must
/// be atomic with the append -- no observer may ever see more than `maxlen`
/// entries (§4.1).
#[expect(async_fn_in_trait, reason = "no dyn dispatch needed; internal workspace only")]
pub trait QueueWrite {
    /// Append `item`, trimming the oldest entries first if over `maxlen`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] if the queue has been shut down.
    async fn push(&self, item: AlertEnvelope) -> Result<(), QueueError>;
}

/// Read side of a named FIFO queue: a blocking pop bounded by a timeout.
#[expect(async_fn_in_trait, reason = "no dyn dispatch needed; internal workspace only")]
pub trait QueueRead {
    /// Pop the oldest entry, waiting up to `timeout`.
    ///
    /// Returns `Ok(None)` on timeout (empty queue). Decode failures are
    /// surfaced as `Err` and should be dropped-and-logged by the caller
    /// rather than treated as a hard stage failure (§7).
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Decode`] when a popped payload is not a JSON
    /// object, or [`QueueError::Closed`] when the queue has been shut down.
    async fn pop(&self, timeout: Duration) -> Result<Option<AlertEnvelope>, QueueError>;
}

// ---------------------------------------------------------------------------
// Receiver (§4.2)
// ---------------------------------------------------------------------------

/// One hit from a forward-only sorted search, carrying the sort values
/// needed to advance `search_after`.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub source: AlertEnvelope,
    pub sort: Vec<Value>,
}

/// Errors from the upstream search index.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    #[error("search index query failed: {0}")]
    Query(String),
}

/// A forward-only, cursor-advancing stream of raw alerts from the search
/// index (`ElasticAlertReceiver.stream` in the Python original).
#[expect(async_fn_in_trait, reason = "no dyn dispatch needed; internal workspace only")]
pub trait AlertSource {
    /// Issue one page of the sorted query, optionally continuing from
    /// `search_after` (the last hit's `sort` array).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Query`] on any index-side failure; the caller
    /// must not advance its cursor in that case and should retry with backoff.
    async fn search(&self, search_after: Option<&[Value]>) -> Result<Vec<SearchHit>, SourceError>;
}

// ---------------------------------------------------------------------------
// Asset catalog (§4.3)
// ---------------------------------------------------------------------------

/// Resolved asset context for an IP (`criticality`, `exposure` in `[0, 1]`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssetProfile {
    pub criticality: f64,
    pub exposure: f64,
    pub sensitive: bool,
}

/// Read-only, process-lifetime lookup of asset context by IP.
pub trait AssetCatalog {
    /// Resolve `ip` to an [`AssetProfile`]: direct match, then CIDR match,
    /// then the private/public/unparseable default triple (§4.3).
    fn resolve(&self, ip: &str) -> AssetProfile;
}

// ---------------------------------------------------------------------------
// History store (§4.3)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, thiserror::Error)]
pub enum HistoryError {
    #[error("history store unavailable: {0}")]
    Unavailable(String),
}

/// Rolling per-day alert counts per bucket key.
#[expect(async_fn_in_trait, reason = "no dyn dispatch needed; internal workspace only")]
pub trait HistoryStore {
    /// Arithmetic mean of the daily counts actually present over the 14-day
    /// window ending at `today` (0.0 if none present).
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Unavailable`] when the backing store cannot
    /// be reached.
    async fn get_14d_daily_avg(&self, bucket_key: &str, today: NaiveDate) -> Result<f64, HistoryError>;

    /// Record `count` new events for `bucket_key` on `today`, pruning any day
    /// older than the retention window.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Unavailable`] when the backing store cannot
    /// be reached.
    async fn record(&self, bucket_key: &str, today: NaiveDate, count: u64) -> Result<(), HistoryError>;
}

// ---------------------------------------------------------------------------
// Business matcher model (§4.4)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelizerError {
    #[error("business matcher model inference failed: {0}")]
    Inference(String),
}

/// The trained classifier plus its feature pipeline, modeled as a single
/// opaque port: feature extraction internals are out of scope, only
/// "raw alert in, probability out" is.
#[expect(async_fn_in_trait, reason = "no dyn dispatch needed; internal workspace only")]
pub trait BusinessMatcherModel {
    /// Probability (`[0, 1]`) that `raw` is a business false positive.
    ///
    /// # Errors
    ///
    /// Returns [`ModelizerError::Inference`] when feature extraction or
    /// inference fails for this instance.
    async fn predict_proba(&self, raw: &AlertEnvelope) -> Result<f64, ModelizerError>;
}

/// Fetches raw alerts by reference id for Module 2's re-hydration step.
/// Per-chunk failures are swallowed internally (§4.4 step 1, §9 Open
/// Question (c)) -- this port therefore never returns an `Err`.
#[expect(async_fn_in_trait, reason = "no dyn dispatch needed; internal workspace only")]
pub trait RawAlertFetcher {
    /// Fetch alerts matching any of `ids`, chunked into batches of
    /// `batch_size`. A chunk that fails to fetch contributes no rows.
    async fn fetch_by_reference_ids(&self, ids: &[String], batch_size: usize) -> Vec<AlertEnvelope>;
}

// ---------------------------------------------------------------------------
// LLM client (§4.5, §9)
// ---------------------------------------------------------------------------

/// The LLM treated as a black-box text/JSON generation service.
#[expect(async_fn_in_trait, reason = "no dyn dispatch needed; internal workspace only")]
pub trait LlmClient {
    /// Generate free text for `prompt`.
    async fn generate_text(&self, prompt: &str) -> String;

    /// Generate a JSON object for `prompt`, returning `fallback` whenever the
    /// response cannot be parsed as a JSON object (never returns `Err`: a
    /// parse failure is itself part of the documented contract, §7).
    async fn generate_json(&self, prompt: &str, fallback: Value) -> Value;
}

// ---------------------------------------------------------------------------
// Retrieval tools (§4.6)
// ---------------------------------------------------------------------------

/// The five index-search tools plus CMDB lookup (`InternalTools` in the
/// Python original).
#[expect(async_fn_in_trait, reason = "no dyn dispatch needed; internal workspace only")]
pub trait InternalTools {
    /// Dispatch one of the five `search_*_logs` tools by name against its
    /// configured index.
    async fn search_logs(&self, tool: &str, query: Value, size: Option<u32>) -> ToolResult;

    /// Query CMDB asset info by IP.
    async fn get_cmdb_asset(&self, ip: &str) -> ToolResult;
}

/// External reputation lookups (`ExternalTools` in the Python original).
#[expect(async_fn_in_trait, reason = "no dyn dispatch needed; internal workspace only")]
pub trait ExternalTools {
    async fn virustotal_ip_reputation(&self, ip: &str) -> ToolResult;
    async fn cve_search(&self, query: &str) -> ToolResult;
}

/// The five internal index-search tool names dispatched through
/// [`InternalTools::search_logs`].
pub const INTERNAL_QUERY_TOOLS: &[&str] = &[
    "search_waf_logs",
    "search_tianyan_alarm_logs",
    "search_zhongzi_logs",
    "search_nginx_logs",
    "search_huorong_logs",
];
