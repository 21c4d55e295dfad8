//! In-memory, per-process bucket table keyed by [`NormalizedAlert::bucket_key`]
//! (`LightweightAggregator` in the Python original).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use domain::{BucketState, NormalizedAlert, Snapshot};

/// Accumulates normalized alerts into buckets and flushes those idle for at
/// least `window_s`.
#[derive(Debug)]
pub struct Aggregator {
    window_s: i64,
    max_ref_ids: usize,
    buckets: HashMap<String, BucketState>,
}

impl Aggregator {
    #[must_use]
    pub fn new(window_s: i64, max_ref_ids: usize) -> Self {
        Self { window_s, max_ref_ids, buckets: HashMap::new() }
    }

    pub fn add(&mut self, alert: &NormalizedAlert) {
        self.buckets
            .entry(alert.bucket_key())
            .and_modify(|bucket| bucket.add(alert))
            .or_insert_with(|| BucketState::new(alert, self.max_ref_ids));
    }

    /// Remove and snapshot every bucket idle for at least `window_s` as of
    /// `now`.
    pub fn flush_expired(&mut self, now: DateTime<Utc>) -> Vec<Snapshot> {
        let window_s = self.window_s;
        let expired: Vec<String> = self
            .buckets
            .iter()
            .filter(|(_, bucket)| bucket.is_expired(now, window_s))
            .map(|(key, _)| key.clone())
            .collect();

        expired
            .into_iter()
            .filter_map(|key| self.buckets.remove(&key))
            .map(|bucket| bucket.to_snapshot())
            .collect()
    }

    /// Flush every remaining bucket regardless of idle time, e.g. at
    /// shutdown.
    pub fn force_flush(&mut self) -> Vec<Snapshot> {
        self.buckets.drain().map(|(_, bucket)| bucket.to_snapshot()).collect()
    }

    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Override the idle window after construction, e.g. in tests that want
    /// every bucket to flush on the next call without waiting.
    pub fn set_window_s(&mut self, window_s: i64) {
        self.window_s = window_s;
    }
}

/// `log1p(count) / log(51)`, clamped to `[0, 1]` -- keeps large bursts bounded
/// without flattening small differences between low counts.
#[must_use]
pub fn normalize_frequency(count: u64) -> f64 {
    ((count as f64).ln_1p() / 51f64.ln()).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use domain::AlertEnvelope;

    fn alert_at(secs: i64) -> NormalizedAlert {
        NormalizedAlert {
            raw_id: format!("id-{secs}"),
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            sip: "1.1.1.1".to_owned(),
            dip: "10.0.0.5".to_owned(),
            proto: "tcp".to_owned(),
            rule_name: "SQLi".to_owned(),
            log_type: "waf".to_owned(),
            uri_template: "/api".to_owned(),
            severity: 0.5,
            confidence: 0.5,
            src_external: false,
            dst_sensitive: false,
            raw: AlertEnvelope::default(),
        }
    }

    #[test]
    fn flush_expired_only_returns_idle_buckets() {
        let mut aggregator = Aggregator::new(300, 200);
        aggregator.add(&alert_at(0));
        let now = Utc.timestamp_opt(100, 0).unwrap();
        assert!(aggregator.flush_expired(now).is_empty());

        let later = Utc.timestamp_opt(400, 0).unwrap();
        let snapshots = aggregator.flush_expired(later);
        assert_eq!(snapshots.len(), 1);
        assert_eq!(aggregator.bucket_count(), 0);
    }

    #[test]
    fn force_flush_drains_everything_immediately() {
        let mut aggregator = Aggregator::new(300, 200);
        aggregator.add(&alert_at(0));
        aggregator.add(&alert_at(1));
        assert_eq!(aggregator.force_flush().len(), 1);
        assert_eq!(aggregator.bucket_count(), 0);
    }

    #[test]
    fn frequency_normalizer_saturates_near_fifty() {
        assert!(normalize_frequency(0) < 0.01);
        assert!((normalize_frequency(50) - 1.0).abs() < 0.01);
        assert!(normalize_frequency(5_000) <= 1.0);
    }
}
