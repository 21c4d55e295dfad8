//! Adapter for the [`ExternalTools`] port (`ExternalTools` in the Python
//! original's `tools_external.py`): VirusTotal IP reputation and CVE search
//! over plain HTTP.

use std::time::Duration;

use domain::{ExternalTools, ToolResult};
use reqwest::Client;
use serde_json::{Map, Value, json};

/// HTTP client for the two external reputation lookups.
#[derive(Debug, Clone)]
pub struct HttpExternalTools {
    http: Client,
    vt_base_url: String,
    vt_api_key: String,
    cve_base_url: String,
    cve_api_key: String,
}

impl HttpExternalTools {
    #[must_use]
    pub fn new(vt_base_url: impl Into<String>, vt_api_key: impl Into<String>, cve_base_url: impl Into<String>, cve_api_key: impl Into<String>, timeout: Duration) -> Self {
        let http = Client::builder().timeout(timeout).build().unwrap_or_else(|_| Client::new());
        Self { http, vt_base_url: vt_base_url.into(), vt_api_key: vt_api_key.into(), cve_base_url: cve_base_url.into(), cve_api_key: cve_api_key.into() }
    }

    async fn get_json_or_text(&self, tool: &str, mut request: reqwest::RequestBuilder) -> ToolResult {
        request = request.header("accept", "application/json");
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
                ToolResult { tool: tool.to_owned(), success, query: None, summary: String::new(), data, error: None }
            }
            Err(error) => ToolResult::failed(tool, None, "", error.to_string()),
        }
    }
}

impl ExternalTools for HttpExternalTools {
    async fn virustotal_ip_reputation(&self, ip: &str) -> ToolResult {
        let url = virustotal_url(&self.vt_base_url, ip);
        let mut request = self.http.get(&url);
        if !self.vt_api_key.is_empty() {
            request = request.header("x-apikey", &self.vt_api_key);
        }
        self.get_json_or_text("virustotal_ip_reputation", request).await
    }

    async fn cve_search(&self, query: &str) -> ToolResult {
        let url = cve_search_url(&self.cve_base_url);
        let mut request = self.http.get(&url).query(&[("q", query)]);
        if !self.cve_api_key.is_empty() {
            request = request.header("X-Api-Key", &self.cve_api_key);
        }
        self.get_json_or_text("cve_search", request).await
    }
}

/// `GET {vt_base_url}/ip_addresses/{ip}`.
fn virustotal_url(vt_base_url: &str, ip: &str) -> String {
    format!("{vt_base_url}/ip_addresses/{ip}")
}

/// `GET {cve_base_url}/search` (query param `q` is attached separately).
fn cve_search_url(cve_base_url: &str) -> String {
    format!("{cve_base_url}/search")
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_caps_at_the_requested_character_count() {
        let text = "x".repeat(20);
        assert_eq!(truncate(&text, 5), "xxxxx");
    }

    #[test]
    fn virustotal_url_appends_ip_addresses_segment_and_ip() {
        let url = virustotal_url("https://www.virustotal.com/api/v3", "1.2.3.4");
        assert_eq!(url, "https://www.virustotal.com/api/v3/ip_addresses/1.2.3.4");
    }

    #[test]
    fn cve_search_url_appends_search_segment() {
        let url = cve_search_url("https://api.cvesearch.com");
        assert_eq!(url, "https://api.cvesearch.com/search");
    }
}
