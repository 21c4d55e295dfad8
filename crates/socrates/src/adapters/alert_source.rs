//! Adapter for the [`AlertSource`] port (`ElasticAlertReceiver` in the
//! Python original's `receiver.py`): a forward-only sorted query over the
//! raw alert index, advancing by `search_after`.

use domain::{AlertEnvelope, AlertSource, SearchHit, SourceError};
use serde_json::{Value, json};

use super::elastic_client::{EsClient, hits_with_sort};

/// Streams raw alerts from one Elasticsearch index in `@timestamp` order.
#[derive(Debug, Clone)]
pub struct ElasticAlertSource {
    client: EsClient,
    index: String,
    batch_size: u32,
    sort_field: String,
}

impl ElasticAlertSource {
    #[must_use]
    pub fn new(client: EsClient, index: impl Into<String>, batch_size: u32) -> Self {
        Self { client, index: index.into(), batch_size, sort_field: "@timestamp".to_owned() }
    }
}

impl AlertSource for ElasticAlertSource {
    async fn search(&self, search_after: Option<&[Value]>) -> Result<Vec<SearchHit>, SourceError> {
        let mut body = json!({
            "query": {"match_all": {}},
            "sort": [{self.sort_field.clone(): "asc"}, {"_shard_doc": "asc"}],
            "size": self.batch_size,
        });
        if let Some(cursor) = search_after {
            body["search_after"] = Value::Array(cursor.to_vec());
        }

        let response = self.client.search(&self.index, &body).await.map_err(SourceError::Query)?;
        Ok(hits_with_sort(&response)
            .into_iter()
            .filter_map(|(source, sort)| match source {
                Value::Object(map) => Some(SearchHit { source: AlertEnvelope::new(map), sort }),
                _ => None,
            })
            .collect())
    }
}
