//! Wires the normalizer, aggregator, and scorer into a queue-driven loop
//! (`LightweightAggregationPipeline` in the Python original).

use chrono::Utc;
use domain::{AggregatedAlert, AlertEnvelope, AssetCatalog, HistoryStore, QueueError, QueueRead, QueueWrite};

use crate::aggregator::Aggregator;
use crate::config::Module1Config;
use crate::normalizer::AlertNormalizer;
use crate::scorer::RiskScorer;

/// Errors surfaced while running the aggregation/scoring stage.
#[derive(Debug, thiserror::Error)]
pub enum Module1Error {
    #[error("input queue error: {0}")]
    Queue(QueueError),
    #[error("history store unavailable: {0}")]
    History(#[from] domain::HistoryError),
}

/// Normalizes, buckets, scores, and routes alerts between a high-priority
/// output queue and a low-priority suppressed queue.
#[derive(Debug)]
pub struct AggregationPipeline {
    config: Module1Config,
    normalizer: AlertNormalizer,
    scorer: RiskScorer,
    aggregator: Aggregator,
}

impl AggregationPipeline {
    #[must_use]
    pub fn new(config: Module1Config) -> Self {
        let aggregator = Aggregator::new(config.aggregation.window_s, config.aggregation.max_ref_ids);
        let scorer = RiskScorer::new(config.scoring);
        Self { config, normalizer: AlertNormalizer::new(), scorer, aggregator }
    }

    /// Normalize `raw` and fold it into its bucket. Pure and synchronous: no
    /// port is touched until the bucket is flushed.
    pub fn ingest(&mut self, raw: &AlertEnvelope) {
        let normalized = self.normalizer.normalize(raw);
        self.aggregator.add(&normalized);
    }

    /// Flush every bucket idle for at least `window_s`, score it, and route
    /// it to `output` or `suppressed`.
    ///
    /// # Errors
    ///
    /// Returns [`Module1Error::History`] if the history store is unreachable,
    /// or [`Module1Error::Queue`] if routing fails (including `Closed`).
    pub async fn flush_expired<A, H, OutQ, SuppQ>(
        &mut self,
        asset_catalog: &A,
        history: &H,
        output: &OutQ,
        suppressed: &SuppQ,
    ) -> Result<usize, Module1Error>
    where
        A: AssetCatalog,
        H: HistoryStore,
        OutQ: QueueWrite,
        SuppQ: QueueWrite,
    {
        let now = Utc::now();
        let snapshots = self.aggregator.flush_expired(now);
        let mut flushed = 0usize;

        for snapshot in &snapshots {
            let today = now.date_naive();
            let historical_daily_avg = history.get_14d_daily_avg(&snapshot.bucket_key, today).await?;
            let asset_profile = asset_catalog.resolve(&snapshot.dip);
            let score = self.scorer.score(snapshot, historical_daily_avg, asset_profile);
            history.record(&snapshot.bucket_key, today, snapshot.count).await?;

            let aggregated = AggregatedAlert::from_snapshot(snapshot, score);
            let envelope = aggregated.to_envelope();

            if self.scorer.is_high_priority(&score) {
                output.push(envelope).await.map_err(Module1Error::Queue)?;
            } else {
                suppressed.push(envelope).await.map_err(Module1Error::Queue)?;
            }
            flushed += 1;
        }

        log::debug!("module1.flush: buckets={flushed}");
        Ok(flushed)
    }

    /// Drive the stage until the input queue signals
    /// [`QueueError::Closed`]: pop one raw alert (or time out), ingest it if
    /// present, then flush and route whatever buckets have gone idle.
    ///
    /// # Errors
    ///
    /// Returns [`Module1Error::Queue`] for any input-queue error other than
    /// `Closed`, or [`Module1Error::History`] from [`Self::flush_expired`].
    pub async fn run<Q, A, H, OutQ, SuppQ>(
        &mut self,
        input: &Q,
        asset_catalog: &A,
        history: &H,
        output: &OutQ,
        suppressed: &SuppQ,
    ) -> Result<(), Module1Error>
    where
        Q: QueueRead,
        A: AssetCatalog,
        H: HistoryStore,
        OutQ: QueueWrite,
        SuppQ: QueueWrite,
    {
        loop {
            match input.pop(self.config.aggregation.flush_interval).await {
                Ok(Some(raw)) => self.ingest(&raw),
                Ok(None) => {}
                Err(QueueError::Closed) => {
                    self.flush_expired(asset_catalog, history, output, suppressed).await?;
                    log::info!("module1.run.stopped: queue closed");
                    return Ok(());
                }
                Err(e @ QueueError::Decode(_)) => {
                    log::warn!("module1.run.drop_malformed: error={e}");
                }
            }
            self.flush_expired(asset_catalog, history, output, suppressed).await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use domain::{AssetProfile, HistoryError};
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct FixedAssetCatalog(AssetProfile);
    impl AssetCatalog for FixedAssetCatalog {
        fn resolve(&self, _ip: &str) -> AssetProfile {
            self.0
        }
    }

    struct InMemoryHistory(RefCell<HashMap<String, f64>>);
    impl HistoryStore for InMemoryHistory {
        async fn get_14d_daily_avg(&self, bucket_key: &str, _today: NaiveDate) -> Result<f64, HistoryError> {
            Ok(*self.0.borrow().get(bucket_key).unwrap_or(&0.0))
        }
        async fn record(&self, bucket_key: &str, _today: NaiveDate, count: u64) -> Result<(), HistoryError> {
            self.0.borrow_mut().insert(bucket_key.to_owned(), count as f64);
            Ok(())
        }
    }

    struct RecordingQueue(RefCell<Vec<AlertEnvelope>>);
    impl QueueWrite for RecordingQueue {
        async fn push(&self, item: AlertEnvelope) -> Result<(), QueueError> {
            self.0.borrow_mut().push(item);
            Ok(())
        }
    }

    fn raw_alert(sip: &str, rule: &str) -> AlertEnvelope {
        let mut e = AlertEnvelope::default();
        e.set("source", serde_json::json!({"ip": sip}));
        e.set("destination", serde_json::json!({"ip": "203.0.113.9"}));
        e.set("rule_name", rule.into());
        e.set("severity", "critical".into());
        e.set("confidence", "critical".into());
        e
    }

    #[tokio::test]
    async fn high_risk_bucket_routes_to_output_not_suppressed() {
        // window_s = 0 so the very next flush_expired call (called with
        // "now") already sees every bucket as idle, without needing to
        // fake the system clock.
        let config = Module1Config::builder().window_s(1).build().unwrap();
        let mut pipeline = AggregationPipeline::new(config);
        for _ in 0..10 {
            pipeline.ingest(&raw_alert("203.0.113.5", "Remote Code Execution"));
        }
        pipeline.aggregator.set_window_s(0);

        let asset_catalog = FixedAssetCatalog(AssetProfile { criticality: 0.9, exposure: 0.8, sensitive: true });
        let history = InMemoryHistory(RefCell::new(HashMap::new()));
        let output = RecordingQueue(RefCell::new(vec![]));
        let suppressed = RecordingQueue(RefCell::new(vec![]));

        let flushed = pipeline.flush_expired(&asset_catalog, &history, &output, &suppressed).await.unwrap();

        assert_eq!(flushed, 1);
        assert_eq!(output.0.borrow().len(), 1);
        assert!(suppressed.0.borrow().is_empty());
    }

    #[tokio::test]
    async fn low_risk_bucket_routes_to_suppressed() {
        let config = Module1Config::builder().window_s(1).build().unwrap();
        let mut pipeline = AggregationPipeline::new(config);
        let mut quiet = raw_alert("10.0.0.2", "heartbeat");
        quiet.set("severity", "info".into());
        quiet.set("confidence", "info".into());
        pipeline.ingest(&quiet);
        pipeline.aggregator.set_window_s(0);

        let asset_catalog = FixedAssetCatalog(AssetProfile { criticality: 0.1, exposure: 0.1, sensitive: false });
        let history = InMemoryHistory(RefCell::new(HashMap::new()));
        let output = RecordingQueue(RefCell::new(vec![]));
        let suppressed = RecordingQueue(RefCell::new(vec![]));

        pipeline.flush_expired(&asset_catalog, &history, &output, &suppressed).await.unwrap();

        assert!(output.0.borrow().is_empty());
        assert_eq!(suppressed.0.borrow().len(), 1);
    }
}
