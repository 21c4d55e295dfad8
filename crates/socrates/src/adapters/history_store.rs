//! In-memory demo adapter for the [`HistoryStore`] port. A production
//! deployment backs this with Redis sorted sets and hashes keyed by day
//! (`RedisHistoryStore` in the Python original); here the same retention and
//! averaging semantics are reproduced over a plain map.

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::NaiveDate;
use domain::{HistoryError, HistoryStore};

/// Rolling per-day counts per bucket key, pruned to `history_days` on write.
#[derive(Debug)]
pub struct InMemoryHistoryStore {
    inner: RefCell<HashMap<String, HashMap<NaiveDate, u64>>>,
    history_days: i64,
}

impl InMemoryHistoryStore {
    #[must_use]
    pub fn new(history_days: i64) -> Self {
        Self { inner: RefCell::new(HashMap::new()), history_days }
    }
}

impl HistoryStore for InMemoryHistoryStore {
    async fn get_14d_daily_avg(&self, bucket_key: &str, today: NaiveDate) -> Result<f64, HistoryError> {
        let inner = self.inner.borrow();
        let Some(days) = inner.get(bucket_key) else { return Ok(0.0) };
        let window_start = today - chrono::Duration::days(self.history_days - 1);
        let present: Vec<u64> = days.iter().filter(|(day, _)| **day >= window_start && **day <= today).map(|(_, count)| *count).collect();
        if present.is_empty() {
            return Ok(0.0);
        }
        #[expect(clippy::cast_precision_loss, reason = "daily alert counts never approach f64's precision limit")]
        let avg = present.iter().sum::<u64>() as f64 / present.len() as f64;
        Ok(avg)
    }

    async fn record(&self, bucket_key: &str, today: NaiveDate, count: u64) -> Result<(), HistoryError> {
        let mut inner = self.inner.borrow_mut();
        let days = inner.entry(bucket_key.to_owned()).or_default();
        *days.entry(today).or_insert(0) += count;

        let cutoff = today - chrono::Duration::days(self.history_days - 1);
        days.retain(|day, _| *day >= cutoff);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    #[tokio::test]
    async fn average_covers_only_days_actually_present() {
        let store = InMemoryHistoryStore::new(14);
        store.record("bucket", date(1), 10).await.unwrap();
        store.record("bucket", date(2), 20).await.unwrap();
        let avg = store.get_14d_daily_avg("bucket", date(2)).await.unwrap();
        assert_eq!(avg, 15.0);
    }

    #[tokio::test]
    async fn unknown_bucket_averages_to_zero() {
        let store = InMemoryHistoryStore::new(14);
        let avg = store.get_14d_daily_avg("missing", date(5)).await.unwrap();
        assert_eq!(avg, 0.0);
    }

    #[tokio::test]
    async fn recording_prunes_days_older_than_the_retention_window() {
        let store = InMemoryHistoryStore::new(14);
        store.record("bucket", date(1), 5).await.unwrap();
        // 20 days later, day 1 is outside the 14-day window and should be pruned.
        store.record("bucket", date(20), 5).await.unwrap();
        let avg = store.get_14d_daily_avg("bucket", date(20)).await.unwrap();
        assert_eq!(avg, 5.0);
    }

    #[tokio::test]
    async fn configured_retention_window_is_honored_not_hardcoded() {
        let store = InMemoryHistoryStore::new(3);
        store.record("bucket", date(1), 5).await.unwrap();
        // Only a 3-day window: day 1 is outside it by day 5 and must be pruned.
        store.record("bucket", date(5), 5).await.unwrap();
        let avg = store.get_14d_daily_avg("bucket", date(5)).await.unwrap();
        assert_eq!(avg, 5.0);
    }
}
