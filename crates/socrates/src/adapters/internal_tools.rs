//! Adapter for the [`InternalTools`] port (`InternalTools` in the Python
//! original's `tools_internal.py`): the five index-search tools plus CMDB
//! asset lookup, all sharing one Elasticsearch client.

use domain::{InternalTools, ToolResult};
use reqwest::Client;
use serde_json::{Map, Value, json};
use std::time::Duration;

use super::elastic_client::{EsClient, source_rows};

/// Elasticsearch-backed log search plus an HTTP-backed CMDB lookup.
#[derive(Debug, Clone)]
pub struct ElasticInternalTools {
    es: EsClient,
    http: Client,
    default_size: u32,
    indices: LogIndices,
    cmdb_base_url: String,
    cmdb_api_key: String,
}

/// The five configured index names, one per `search_*_logs` tool.
#[derive(Debug, Clone)]
pub struct LogIndices {
    pub waf: String,
    pub tianyan: String,
    pub zhongzi: String,
    pub nginx: String,
    pub huorong: String,
}

impl ElasticInternalTools {
    #[must_use]
    pub fn new(
        es: EsClient,
        default_size: u32,
        indices: LogIndices,
        cmdb_base_url: impl Into<String>,
        cmdb_api_key: impl Into<String>,
        cmdb_timeout: Duration,
    ) -> Self {
        let http = Client::builder().timeout(cmdb_timeout).build().unwrap_or_else(|_| Client::new());
        Self { es, http, default_size, indices, cmdb_base_url: cmdb_base_url.into(), cmdb_api_key: cmdb_api_key.into() }
    }

    fn index_for(&self, tool: &str) -> Option<&str> {
        match tool {
            "search_waf_logs" => Some(&self.indices.waf),
            "search_tianyan_alarm_logs" => Some(&self.indices.tianyan),
            "search_zhongzi_logs" => Some(&self.indices.zhongzi),
            "search_nginx_logs" => Some(&self.indices.nginx),
            "search_huorong_logs" => Some(&self.indices.huorong),
            _ => None,
        }
    }

    async fn search_es(&self, tool: &str, index: &str, query: Value, size: Option<u32>) -> ToolResult {
        let final_size = size.unwrap_or(self.default_size).clamp(1, 200);
        let body = json!({"query": query, "size": final_size});

        match self.es.search(index, &body).await {
            Ok(response) => {
                let rows = source_rows(&response);
                let mut data = Map::new();
                let count = rows.len();
                data.insert("total".to_owned(), json!(count));
                data.insert("rows".to_owned(), Value::Array(rows));
                ToolResult::ok(tool, Some(body), format!("{tool} returned {count} rows from index={index}."), data)
            }
            Err(error) => ToolResult::failed(tool, Some(body), format!("{tool} failed."), error),
        }
    }
}

impl InternalTools for ElasticInternalTools {
    async fn search_logs(&self, tool: &str, query: Value, size: Option<u32>) -> ToolResult {
        let Some(index) = self.index_for(tool).map(str::to_owned) else {
            return ToolResult::failed(tool, None, "", "unknown_tool");
        };
        self.search_es(tool, &index, query, size).await
    }

    async fn get_cmdb_asset(&self, ip: &str) -> ToolResult {
        if self.cmdb_base_url.is_empty() {
            return ToolResult::failed("get_cmdb_asset", None, "", "cmdb_base_url_missing");
        }

        let mut request = self.http.get(&self.cmdb_base_url).header("Accept", "application/json").query(&[("ip", ip)]);
        if !self.cmdb_api_key.is_empty() {
            request = request.bearer_auth(&self.cmdb_api_key);
        }

        match request.send().await {
            Ok(response) => {
                let success = response.status().is_success();
                let content_type = response.headers().get("content-type").and_then(|v| v.to_str().ok()).unwrap_or_default().to_owned();
                let body_text = response.text().await.unwrap_or_default();
                let mut data = Map::new();
                if content_type.contains("application/json") {
                    match serde_json::from_str::<Value>(&body_text) {
                        Ok(Value::Object(map)) => data = map,
                        Ok(other) => {
                            data.insert("data".to_owned(), other);
                        }
                        Err(_) => {
                            data.insert("raw_text".to_owned(), json!(truncate(&body_text, 4000)));
                        }
                    }
                } else {
                    data.insert("raw_text".to_owned(), json!(truncate(&body_text, 4000)));
                }
                ToolResult { tool: "get_cmdb_asset".to_owned(), success, query: None, summary: String::new(), data, error: None }
            }
            Err(error) => ToolResult::failed("get_cmdb_asset", None, "", error.to_string()),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_search_tool_is_not_routed_to_any_index() {
        let indices = LogIndices {
            waf: "waf-*".to_owned(),
            tianyan: "tianyan-alarm-*".to_owned(),
            zhongzi: "zhongzi-*".to_owned(),
            nginx: "nginx-*".to_owned(),
            huorong: "huorong-*".to_owned(),
        };
        let tools = ElasticInternalTools::new(EsClient::new("http://localhost:9200", Duration::from_secs(1)), 50, indices, "", "", Duration::from_secs(1));
        assert!(tools.index_for("search_unknown_logs").is_none());
        assert_eq!(tools.index_for("search_waf_logs"), Some("waf-*"));
    }

    #[test]
    fn truncate_caps_at_the_requested_character_count() {
        let text = "a".repeat(10);
        assert_eq!(truncate(&text, 4), "aaaa");
    }
}
