//! Adapter for the [`LlmClient`] port (`Qwen32BClient` in the Python
//! original's `llm_client.py`): a text-generation HTTP endpoint plus the
//! tolerant JSON-extraction logic `generate_json` relies on.
//!
//! The Python original loads a local model in-process; this adapter instead
//! speaks to a generation HTTP server (the kind `vllm`/`text-generation-inference`
//! expose) so the pipeline can stay transport-agnostic. Both `generate_text`
//! and `generate_json` never fail outward: a request error yields an empty
//! string or the caller-supplied fallback, matching the port's no-`Result`
//! contract.

use std::sync::LazyLock;
use std::time::Duration;

use domain::LlmClient;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;

static JSON_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// HTTP client for a single text-generation endpoint.
#[derive(Debug, Clone)]
pub struct HttpLlmClient {
    http: Client,
    base_url: String,
}

impl HttpLlmClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = Client::builder().timeout(timeout).build().unwrap_or_else(|_| Client::new());
        Self { http, base_url: base_url.into() }
    }
}

impl LlmClient for HttpLlmClient {
    async fn generate_text(&self, prompt: &str) -> String {
        let url = format!("{}/generate", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({"prompt": prompt, "max_new_tokens": 1024, "temperature": 0.0});

        let Ok(response) = self.http.post(&url).json(&body).send().await else {
            log::warn!("llm_client.request_failed: base_url={}", self.base_url);
            return String::new();
        };
        let Ok(payload) = response.json::<Value>().await else {
            return String::new();
        };
        payload
            .get("text")
            .or_else(|| payload.get("generated_text"))
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_default()
    }

    async fn generate_json(&self, prompt: &str, fallback: Value) -> Value {
        let text = self.generate_text(prompt).await;
        parse_json_response(&text).unwrap_or(fallback)
    }
}

/// Mirrors `Qwen32BClient._parse_json`: try the trimmed text as a raw JSON
/// object first, then fall back to the first `{...}` block found inside it.
fn parse_json_response(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        return Some(Value::Object(map));
    }

    let block = JSON_BLOCK_RE.find(trimmed)?;
    match serde_json::from_str::<Value>(block.as_str()) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_json_object_parses_without_fallback() {
        let text = r#"  {"verdict": "BENIGN", "confidence": 0.9}  "#;
        let parsed = parse_json_response(text).unwrap();
        assert_eq!(parsed["verdict"], "BENIGN");
    }

    #[test]
    fn prose_wrapped_json_block_is_extracted_via_regex() {
        let text = "Sure, here is the verdict:\n{\"verdict\": \"MALICIOUS\", \"confidence\": 0.8}\nLet me know if you need more.";
        let parsed = parse_json_response(text).unwrap();
        assert_eq!(parsed["verdict"], "MALICIOUS");
        assert_eq!(parsed["confidence"], 0.8);
    }

    #[test]
    fn json_array_is_not_treated_as_an_object() {
        let text = r#"[{"verdict": "BENIGN"}]"#;
        assert!(parse_json_response(text).is_none());
    }

    #[test]
    fn unparseable_text_returns_none_so_caller_falls_back() {
        assert!(parse_json_response("the model rambled with no json at all").is_none());
    }

    #[test]
    fn multiline_block_spanning_newlines_is_still_matched() {
        let text = "{\n  \"verdict\": \"SUSPICIOUS\",\n  \"confidence\": 0.6\n}";
        let parsed = parse_json_response(text).unwrap();
        assert_eq!(parsed["verdict"], "SUSPICIOUS");
    }
}
