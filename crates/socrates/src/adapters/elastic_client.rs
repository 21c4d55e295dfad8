//! Thin Elasticsearch HTTP client shared by the receiver's [`AlertSource`]
//! adapter, Module 2's [`RawAlertFetcher`] adapter, and Module 3's
//! [`InternalTools`] adapter. Mirrors the Python original's shared
//! `Elasticsearch` client instance (`InternalTools.__post_init__`).
//!
//! [`AlertSource`]: domain::AlertSource
//! [`RawAlertFetcher`]: domain::RawAlertFetcher
//! [`InternalTools`]: domain::InternalTools

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

/// A reusable HTTP client bound to one Elasticsearch deployment.
#[derive(Debug, Clone)]
pub struct EsClient {
    http: Client,
    base_url: String,
}

impl EsClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = Client::builder().timeout(timeout).build().unwrap_or_else(|_| Client::new());
        Self { http, base_url: base_url.into() }
    }

    /// Run `body` against `{base_url}/{index}/_search` and return the raw
    /// response JSON.
    ///
    /// # Errors
    ///
    /// Returns a description of the failure on a transport error or a
    /// non-2xx response.
    pub async fn search(&self, index: &str, body: &Value) -> Result<Value, String> {
        let url = format!("{}/{}/_search", self.base_url, index);
        let response = self.http.post(&url).json(body).send().await.map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("elasticsearch returned status {}", response.status()));
        }
        response.json::<Value>().await.map_err(|e| e.to_string())
    }
}

/// Pull `_source` and `sort` out of every hit in a `_search` response.
#[must_use]
pub fn hits_with_sort(response: &Value) -> Vec<(Value, Vec<Value>)> {
    response["hits"]["hits"]
        .as_array()
        .into_iter()
        .flatten()
        .map(|hit| {
            let source = hit.get("_source").cloned().unwrap_or(Value::Null);
            let sort = hit.get("sort").and_then(Value::as_array).cloned().unwrap_or_default();
            (source, sort)
        })
        .collect()
}

/// Pull just the `_source` rows out of a `_search` response, in hit order.
#[must_use]
pub fn source_rows(response: &Value) -> Vec<Value> {
    response["hits"]["hits"].as_array().into_iter().flatten().map(|hit| hit.get("_source").cloned().unwrap_or(Value::Null)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hits_with_sort_extracts_source_and_sort_pairs() {
        let response = json!({
            "hits": {"hits": [
                {"_source": {"sip": "1.1.1.1"}, "sort": [1700000000]},
                {"_source": {"sip": "2.2.2.2"}, "sort": [1700000001]},
            ]}
        });
        let hits = hits_with_sort(&response);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0["sip"], "1.1.1.1");
        assert_eq!(hits[1].1, vec![json!(1_700_000_001)]);
    }

    #[test]
    fn source_rows_handles_missing_hits_gracefully() {
        let response = json!({});
        assert!(source_rows(&response).is_empty());
    }
}
