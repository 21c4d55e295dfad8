// Rust guideline compliant 2026-08-01

//! Receiver component -- streams raw alerts from the search index and
//! republishes each one onto the shared alerts queue (§4.2).
//!
//! Entry points: [`Receiver::poll_once`], [`Receiver::run`]. Configuration
//! via [`ReceiverConfig::builder`].

use std::time::Duration;

use domain::{AlertSource, QueueError, QueueWrite, SourceError};
use serde_json::Value;

// ---------------------------------------------------------------------------
// ReceiverError
// ---------------------------------------------------------------------------

/// Errors that can occur while receiving and republishing alerts.
#[derive(Debug, thiserror::Error)]
pub enum ReceiverError {
    /// The supplied configuration is invalid.
    #[error("invalid receiver configuration: {reason}")]
    InvalidConfig { reason: String },
    /// The output queue has been closed.
    #[error("queue error: {0}")]
    Queue(QueueError),
}

// ---------------------------------------------------------------------------
// ReceiverConfig + builder
// ---------------------------------------------------------------------------

/// Runtime configuration for a [`Receiver`].
///
/// Construct via [`ReceiverConfig::builder`].
#[derive(Debug)]
pub struct ReceiverConfig {
    /// Delay between polls that return an empty page.
    pub poll_interval: Duration,
    /// Backoff cap after repeated query failures (§4.2: "retried after a
    /// short backoff"). Backoff starts at `poll_interval` and doubles up to
    /// this cap, resetting to `poll_interval` on the next success.
    pub max_backoff: Duration,
    /// Optional upper bound on the number of poll iterations. `None` means
    /// run until the queue signals `Closed`.
    pub iterations: Option<u64>,
}

/// Builder for [`ReceiverConfig`].
#[derive(Debug)]
pub struct ReceiverConfigBuilder {
    poll_interval: Duration,
    max_backoff: Duration,
    iterations: Option<u64>,
}

impl ReceiverConfig {
    /// Create a builder with the default cadence (`poll_interval = 1s`,
    /// `max_backoff = 8s`).
    #[must_use]
    pub fn builder() -> ReceiverConfigBuilder {
        ReceiverConfigBuilder {
            poll_interval: Duration::from_secs(1),
            max_backoff: Duration::from_secs(8),
            iterations: None,
        }
    }
}

impl ReceiverConfigBuilder {
    #[must_use]
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    #[must_use]
    pub fn max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    #[must_use]
    pub fn iterations(mut self, n: u64) -> Self {
        self.iterations = Some(n);
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiverError::InvalidConfig`] when `max_backoff <
    /// poll_interval`.
    pub fn build(self) -> Result<ReceiverConfig, ReceiverError> {
        if self.max_backoff < self.poll_interval {
            return Err(ReceiverError::InvalidConfig {
                reason: "max_backoff must be >= poll_interval".to_owned(),
            });
        }
        Ok(ReceiverConfig {
            poll_interval: self.poll_interval,
            max_backoff: self.max_backoff,
            iterations: self.iterations,
        })
    }
}

// ---------------------------------------------------------------------------
// Receiver
// ---------------------------------------------------------------------------

/// Drains a forward-only [`AlertSource`] and republishes every hit onto a
/// [`QueueWrite`] port, advancing a `search_after` cursor across calls.
///
/// Generic over both ports for zero-cost static dispatch; holds no concrete
/// adapter reference.
#[derive(Debug)]
pub struct Receiver {
    config: ReceiverConfig,
}

impl Receiver {
    #[must_use]
    pub fn new(config: ReceiverConfig) -> Self {
        Self { config }
    }

    /// Issue one query against `source` starting from `cursor`, publish every
    /// hit to `queue`, and advance `cursor` to the last hit's sort values.
    ///
    /// On an empty page, `cursor` is left unchanged and the caller should
    /// sleep `poll_interval` before retrying. On a query error, `cursor` is
    /// left unchanged (§4.2: "the cursor is not advanced on failure").
    ///
    /// # Errors
    ///
    /// Returns [`ReceiverError::Queue`] on a queue-write failure (including
    /// `Closed`). Query errors are returned to the caller via the `Result`'s
    /// `Err(Ok(SourceError))`-shaped nesting is avoided by returning them as
    /// part of the `Ok` variant's `Err(SourceError)` field instead, so the
    /// caller can apply backoff without treating it as a hard stop.
    pub async fn poll_once<S, Q>(&self, source: &S, queue: &Q, cursor: &mut Option<Vec<Value>>) -> Result<PollOutcome, ReceiverError>
    where
        S: AlertSource,
        Q: QueueWrite,
    {
        let hits = match source.search(cursor.as_deref()).await {
            Ok(hits) => hits,
            Err(e) => return Ok(PollOutcome::QueryFailed(e)),
        };

        if hits.is_empty() {
            return Ok(PollOutcome::Empty);
        }

        let mut published = 0usize;
        for hit in &hits {
            queue.push(hit.source.clone()).await.map_err(ReceiverError::Queue)?;
            published += 1;
        }

        if let Some(last) = hits.last() {
            *cursor = Some(last.sort.clone());
        }

        log::debug!("receiver.batch.published: count={published}");
        Ok(PollOutcome::Published(published))
    }

    /// Run the receive loop until stopped.
    ///
    /// Sleeps `poll_interval` after an empty page; on a query failure,
    /// backs off geometrically up to `max_backoff`, resetting on the next
    /// success. Stops cleanly when the queue signals
    /// [`QueueError::Closed`] (returns `Ok(())`) or `config.iterations` polls
    /// have completed.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiverError::Queue`] for any queue error other than
    /// `Closed`.
    pub async fn run<S, Q>(&self, source: &S, queue: &Q) -> Result<(), ReceiverError>
    where
        S: AlertSource,
        Q: QueueWrite,
    {
        let mut cursor: Option<Vec<Value>> = None;
        let mut backoff = self.config.poll_interval;
        let mut count = 0u64;

        loop {
            match self.poll_once(source, queue, &mut cursor).await {
                Ok(PollOutcome::Published(n)) => {
                    backoff = self.config.poll_interval;
                    log::info!("receiver.poll.published: iteration={count} count={n}");
                }
                Ok(PollOutcome::Empty) => {
                    backoff = self.config.poll_interval;
                    tokio::time::sleep(self.config.poll_interval).await;
                }
                Ok(PollOutcome::QueryFailed(e)) => {
                    log::warn!("receiver.poll.query_failed: error={e} backoff={backoff:?}");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(self.config.max_backoff);
                }
                Err(ReceiverError::Queue(QueueError::Closed)) => {
                    log::info!("receiver.run.stopped: queue closed after {count} iteration(s)");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }

            count += 1;
            if let Some(max) = self.config.iterations
                && count >= max
            {
                log::info!("receiver.run.stopped: iteration limit reached");
                return Ok(());
            }
        }
    }
}

/// Result of a single [`Receiver::poll_once`] call.
#[derive(Debug)]
pub enum PollOutcome {
    /// `n` hits were published; the cursor advanced.
    Published(usize),
    /// The page was empty; the cursor is unchanged.
    Empty,
    /// The query failed; the cursor is unchanged.
    QueryFailed(SourceError),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::{PollOutcome, Receiver, ReceiverConfig};
    use domain::{AlertEnvelope, QueueError, QueueWrite, SearchHit, SourceError};
    use std::cell::RefCell;
    use std::time::Duration;

    struct ScriptedSource {
        pages: RefCell<Vec<Result<Vec<SearchHit>, SourceError>>>,
    }

    impl domain::AlertSource for ScriptedSource {
        async fn search(&self, _search_after: Option<&[serde_json::Value]>) -> Result<Vec<SearchHit>, SourceError> {
            self.pages.borrow_mut().remove(0)
        }
    }

    struct RecordingQueue {
        pushed: RefCell<Vec<AlertEnvelope>>,
        closed: bool,
    }

    impl QueueWrite for RecordingQueue {
        async fn push(&self, item: AlertEnvelope) -> Result<(), QueueError> {
            if self.closed {
                return Err(QueueError::Closed);
            }
            self.pushed.borrow_mut().push(item);
            Ok(())
        }
    }

    fn hit(raw_id: &str) -> SearchHit {
        let mut envelope = AlertEnvelope::default();
        envelope.set("id", raw_id.into());
        SearchHit {
            source: envelope,
            sort: vec![serde_json::json!(raw_id)],
        }
    }

    #[tokio::test]
    async fn publishes_hits_and_advances_cursor() {
        let source = ScriptedSource {
            pages: RefCell::new(vec![Ok(vec![hit("a"), hit("b")])]),
        };
        let queue = RecordingQueue { pushed: RefCell::new(vec![]), closed: false };
        let receiver = Receiver::new(ReceiverConfig::builder().build().unwrap());
        let mut cursor = None;

        let outcome = receiver.poll_once(&source, &queue, &mut cursor).await.unwrap();
        assert!(matches!(outcome, PollOutcome::Published(2)));
        assert_eq!(queue.pushed.borrow().len(), 2);
        assert_eq!(cursor, Some(vec![serde_json::json!("b")]));
    }

    #[tokio::test]
    async fn empty_page_leaves_cursor_unchanged() {
        let source = ScriptedSource { pages: RefCell::new(vec![Ok(vec![])]) };
        let queue = RecordingQueue { pushed: RefCell::new(vec![]), closed: false };
        let receiver = Receiver::new(ReceiverConfig::builder().build().unwrap());
        let mut cursor = Some(vec![serde_json::json!("prev")]);

        let outcome = receiver.poll_once(&source, &queue, &mut cursor).await.unwrap();
        assert!(matches!(outcome, PollOutcome::Empty));
        assert_eq!(cursor, Some(vec![serde_json::json!("prev")]));
    }

    #[tokio::test]
    async fn query_error_leaves_cursor_unchanged() {
        let source = ScriptedSource {
            pages: RefCell::new(vec![Err(SourceError::Query("timeout".to_owned()))]),
        };
        let queue = RecordingQueue { pushed: RefCell::new(vec![]), closed: false };
        let receiver = Receiver::new(ReceiverConfig::builder().build().unwrap());
        let mut cursor = Some(vec![serde_json::json!("prev")]);

        let outcome = receiver.poll_once(&source, &queue, &mut cursor).await.unwrap();
        assert!(matches!(outcome, PollOutcome::QueryFailed(_)));
        assert_eq!(cursor, Some(vec![serde_json::json!("prev")]));
    }

    #[tokio::test]
    async fn run_stops_on_closed_queue() {
        let source = ScriptedSource {
            pages: RefCell::new(vec![Ok(vec![hit("a")]), Ok(vec![])]),
        };
        let queue = RecordingQueue { pushed: RefCell::new(vec![]), closed: true };
        let receiver = Receiver::new(
            ReceiverConfig::builder()
                .poll_interval(Duration::ZERO)
                .build()
                .unwrap(),
        );
        let result = receiver.run(&source, &queue).await;
        assert!(result.is_ok(), "queue Closed must stop the loop cleanly: {result:?}");
    }
}
