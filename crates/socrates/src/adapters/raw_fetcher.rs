//! Adapter for the [`RawAlertFetcher`] port (`ElasticRawAlertFetcher` in the
//! Python original): re-hydrates an aggregated alert's member instances by
//! reference id, chunked and with per-chunk failures swallowed.

use domain::{AlertEnvelope, RawAlertFetcher};
use serde_json::{Value, json};

use super::elastic_client::{EsClient, source_rows};

/// Fetches raw alert documents by any of `event.id`/`id`/`alert_id`/`_id`.
#[derive(Debug, Clone)]
pub struct ElasticRawAlertFetcher {
    client: EsClient,
    index: String,
}

impl ElasticRawAlertFetcher {
    #[must_use]
    pub fn new(client: EsClient, index: impl Into<String>) -> Self {
        Self { client, index: index.into() }
    }
}

impl RawAlertFetcher for ElasticRawAlertFetcher {
    async fn fetch_by_reference_ids(&self, ids: &[String], batch_size: usize) -> Vec<AlertEnvelope> {
        if ids.is_empty() || batch_size == 0 {
            return Vec::new();
        }

        let mut results = Vec::new();
        for chunk in ids.chunks(batch_size) {
            let query = json!({
                "query": {
                    "bool": {
                        "should": [
                            {"terms": {"event.id": chunk}},
                            {"terms": {"id": chunk}},
                            {"terms": {"alert_id": chunk}},
                            {"ids": {"values": chunk}},
                        ],
                        "minimum_should_match": 1,
                    }
                },
                "size": chunk.len(),
            });

            let Ok(response) = self.client.search(&self.index, &query).await else {
                log::warn!("raw_fetcher.chunk_failed: index={} chunk_len={}", self.index, chunk.len());
                continue;
            };

            results.extend(source_rows(&response).into_iter().filter_map(as_envelope));
        }
        results
    }
}

fn as_envelope(value: Value) -> Option<AlertEnvelope> {
    match value {
        Value::Object(map) => Some(AlertEnvelope::new(map)),
        _ => None,
    }
}
