//! Raw alert to [`NormalizedAlert`] field extraction and URI canonicalization
//! (`AlertNormalizer` in the Python original).

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use domain::{AlertEnvelope, NormalizedAlert, value_as_trimmed_string};
use regex::{Captures, Regex};
use serde_json::Value;
use sha2::{Digest, Sha256};

static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[0-9a-f]{8}-[0-9a-f]{4}-[1-5][0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}\b").unwrap()
});
static SHA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b[a-f0-9]{40,64}\b").unwrap());
static HEX_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b[0-9a-f]{12,39}\b").unwrap());
static BASE64_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[A-Za-z0-9+_-]{16,}={0,2}\b").unwrap());
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap());
static IP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").unwrap());
static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{10,13}\b").unwrap());
static LONG_NUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{4,}\b").unwrap());
static QUERY_KEY_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([?&])([^=&]+)=([^&]*)").unwrap());
static MULTI_SLASH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/{2,}").unwrap());
static LONG_PATH_SEGMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{20,}$").unwrap());

const SECRET_QUERY_KEYS: &[&str] = &["auth", "passwd", "password", "secret", "sign"];
const TOKEN_QUERY_KEYS: &[&str] = &["token", "session"];
const TIME_QUERY_KEYS: &[&str] = &["time", "timestamp", "_dc", "ts", "nonce"];

const MAX_URI_LEN: usize = 2048;

fn private_severity(word: &str) -> Option<f64> {
    match word {
        "critical" => Some(1.0),
        "high" => Some(0.8),
        "medium" => Some(0.5),
        "low" => Some(0.2),
        "info" => Some(0.05),
        _ => None,
    }
}

/// Stateless field extraction and URI canonicalization for raw alerts.
#[derive(Debug, Default)]
pub struct AlertNormalizer;

impl AlertNormalizer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Extract a [`NormalizedAlert`] from a raw, schemaless alert payload.
    #[must_use]
    pub fn normalize(&self, raw: &AlertEnvelope) -> NormalizedAlert {
        let timestamp = Self::parse_timestamp(raw.lookup_path(&["@timestamp", "timestamp", "time"]));
        let sip = Self::string_or(raw.lookup_path(&["source.ip", "src_ip", "sip"]), "unknown_src");
        let dip = Self::string_or(raw.lookup_path(&["destination.ip", "dst_ip", "dip"]), "unknown_dst");
        let proto = Self::string_or(raw.lookup_path(&["network.transport", "proto", "protocol"]), "unknown_proto")
            .to_lowercase();
        let rule_name = Self::string_or(
            raw.lookup_path(&["rule.name", "rule_name", "signature", "alert.rule"]),
            "unknown_rule",
        );
        let log_type = Self::string_or(
            raw.lookup_path(&["log_type", "event.dataset", "type", "event.module"]),
            "unknown_log_type",
        );
        let uri = Self::string_or(raw.lookup_path(&["url.path", "http.request.uri", "uri"]), "-");
        let uri_template = Self::normalize_uri(&uri);

        let severity = Self::normalize_score(raw.lookup_path(&["severity", "rule.severity", "priority"]));
        let confidence = Self::normalize_score(raw.lookup_path(&["confidence", "risk_score", "risk.score"]));
        let src_external = Self::is_external_ip(&sip);
        let dst_sensitive = Self::is_sensitive_asset(raw);

        NormalizedAlert {
            raw_id: Self::derive_raw_id(raw, timestamp),
            timestamp,
            sip,
            dip,
            proto,
            rule_name,
            log_type,
            uri_template,
            severity,
            confidence,
            src_external,
            dst_sensitive,
            raw: raw.clone(),
        }
    }

    fn derive_raw_id(raw: &AlertEnvelope, timestamp: DateTime<Utc>) -> String {
        if let Some(id) = value_as_trimmed_string(raw.lookup_path(&["event.id", "id", "alert_id", "_id"])) {
            return id;
        }
        let blob = format!("{}|{:?}", timestamp.to_rfc3339(), raw.as_map());
        let digest = Sha256::digest(blob.as_bytes());
        format!("{digest:x}")
    }

    fn parse_timestamp(value: Option<&Value>) -> DateTime<Utc> {
        match value {
            Some(Value::String(s)) if !s.is_empty() => {
                let candidate = s.replacen('Z', "+00:00", 1);
                DateTime::parse_from_rfc3339(&candidate)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now())
            }
            _ => Utc::now(),
        }
    }

    fn normalize_uri(uri: &str) -> String {
        let trimmed = uri.trim();
        let mut cleaned = if trimmed.is_empty() { "-".to_owned() } else { trimmed.to_owned() };

        cleaned = QUERY_KEY_VALUE_RE.replace_all(&cleaned, redact_query_pair).into_owned();
        cleaned = UUID_RE.replace_all(&cleaned, "<UUID>").into_owned();
        cleaned = SHA_RE.replace_all(&cleaned, "<HASH>").into_owned();
        cleaned = HEX_TOKEN_RE.replace_all(&cleaned, "<TOKEN>").into_owned();
        cleaned = BASE64_TOKEN_RE.replace_all(&cleaned, "<B64TOKEN>").into_owned();
        cleaned = EMAIL_RE.replace_all(&cleaned, "<EMAIL>").into_owned();
        cleaned = IP_RE.replace_all(&cleaned, "<IP>").into_owned();
        cleaned = TIMESTAMP_RE.replace_all(&cleaned, "<TIMESTAMP>").into_owned();
        cleaned = LONG_NUM_RE.replace_all(&cleaned, "<NUM>").into_owned();
        cleaned = MULTI_SLASH_RE.replace_all(&cleaned, "/").into_owned();
        cleaned = collapse_long_path_segments(&cleaned);

        cleaned.chars().take(MAX_URI_LEN).collect()
    }

    fn normalize_score(value: Option<&Value>) -> f64 {
        let Some(value) = value else { return 0.3 };
        match value {
            Value::String(s) => {
                let candidate = s.trim().to_lowercase();
                if let Some(mapped) = private_severity(&candidate) {
                    return mapped;
                }
                candidate.parse::<f64>().map_or(0.3, Self::clamp_score)
            }
            Value::Number(n) => n.as_f64().map_or(0.3, Self::clamp_score),
            _ => 0.3,
        }
    }

    fn clamp_score(value: f64) -> f64 {
        let value = if value > 1.0 { (value / 100.0).min(1.0) } else { value };
        value.clamp(0.0, 1.0)
    }

    fn is_external_ip(ip_text: &str) -> bool {
        ip_text
            .parse::<std::net::IpAddr>()
            .is_ok_and(|ip| !(is_private_or_local(&ip)))
    }

    fn is_sensitive_asset(raw: &AlertEnvelope) -> bool {
        let candidates = [
            raw.lookup_path(&["asset.criticality", "destination.asset_tier", "asset.tier"]),
            raw.lookup_path(&["destination.tags", "asset.tags"]),
        ];
        candidates.into_iter().flatten().any(|value| {
            let text = value_to_lower_text(value);
            ["critical", "prod", "payment", "core"].iter().any(|token| text.contains(token))
        })
    }

    fn string_or(value: Option<&Value>, default: &str) -> String {
        value_as_trimmed_string(value).unwrap_or_else(|| default.to_owned())
    }
}

/// Replace any `/`-delimited path segment of 20+ identifier characters with
/// `<TOKEN>`. `regex` has no lookaround, so this walks segments directly
/// rather than matching `(?<=/)...(?=/|$)` as the Python original does.
fn collapse_long_path_segments(path: &str) -> String {
    path.split('/')
        .map(|segment| if LONG_PATH_SEGMENT_RE.is_match(segment) { "<TOKEN>" } else { segment })
        .collect::<Vec<_>>()
        .join("/")
}

fn is_private_or_local(ip: &std::net::IpAddr) -> bool {
    match ip {
        std::net::IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        std::net::IpAddr::V6(v6) => v6.is_loopback() || v6.is_unicast_link_local(),
    }
}

fn value_to_lower_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.to_lowercase(),
        other => other.to_string().to_lowercase(),
    }
}

fn redact_query_pair(caps: &Captures<'_>) -> String {
    let prefix = &caps[1];
    let raw_key = &caps[2];
    let raw_value = caps[3].trim();
    let key = raw_key.to_lowercase();

    if raw_value.is_empty() {
        return format!("{prefix}{raw_key}=");
    }
    if SECRET_QUERY_KEYS.iter().chain(TOKEN_QUERY_KEYS).any(|needle| key.contains(needle)) {
        let placeholder = if SECRET_QUERY_KEYS.iter().any(|needle| key.contains(needle)) {
            "<SECRET>"
        } else {
            "<TOKEN>"
        };
        return format!("{prefix}{raw_key}={placeholder}");
    }
    if TIME_QUERY_KEYS.iter().any(|needle| key.contains(needle)) {
        return format!("{prefix}{raw_key}=<TIMESTAMP>");
    }
    if raw_value.len() >= 24 {
        return format!("{prefix}{raw_key}=<TOKEN>");
    }
    format!("{prefix}{raw_key}={raw_value}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope_from(value: Value) -> AlertEnvelope {
        let Value::Object(map) = value else { panic!("expected object") };
        AlertEnvelope::new(map)
    }

    #[test]
    fn derives_core_fields_with_fallbacks() {
        let raw = envelope_from(json!({
            "source": {"ip": "203.0.113.5"},
            "destination": {"ip": "10.0.0.9"},
            "rule_name": "SQLi Attempt",
            "severity": "high",
        }));
        let normalized = AlertNormalizer::new().normalize(&raw);
        assert_eq!(normalized.sip, "203.0.113.5");
        assert_eq!(normalized.dip, "10.0.0.9");
        assert_eq!(normalized.proto, "unknown_proto");
        assert_eq!(normalized.rule_name, "SQLi Attempt");
        assert!((normalized.severity - 0.8).abs() < f64::EPSILON);
        assert!(normalized.src_external);
    }

    #[test]
    fn query_value_redaction_splits_token_and_secret() {
        let uri = AlertNormalizer::normalize_uri("/api/login?session=abcdef1234567890abcdef&password=hunter22");
        assert!(uri.contains("session=<TOKEN>"));
        assert!(uri.contains("password=<SECRET>"));
    }

    #[test]
    fn long_query_value_without_keyword_becomes_token() {
        let uri = AlertNormalizer::normalize_uri("/search?q=aaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        assert!(uri.contains("q=<TOKEN>"));
    }

    #[test]
    fn uuid_and_ip_placeholders_apply() {
        let uri = AlertNormalizer::normalize_uri("/items/123e4567-e89b-12d3-a456-426614174000/from/10.0.0.1");
        assert!(uri.contains("<UUID>"));
        assert!(uri.contains("<IP>"));
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let once = AlertNormalizer::normalize_uri("/api//item/000011112222333344445555");
        let twice = AlertNormalizer::normalize_uri(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn score_normalization_handles_strings_percentages_and_missing() {
        assert!((AlertNormalizer::normalize_score(Some(&json!("critical"))) - 1.0).abs() < f64::EPSILON);
        assert!((AlertNormalizer::normalize_score(Some(&json!(90))) - 0.9).abs() < f64::EPSILON);
        assert!((AlertNormalizer::normalize_score(None) - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn raw_id_falls_back_to_digest_when_absent() {
        let raw = envelope_from(json!({"sip": "1.1.1.1"}));
        let normalized = AlertNormalizer::new().normalize(&raw);
        assert_eq!(normalized.raw_id.len(), 64);
    }
}
