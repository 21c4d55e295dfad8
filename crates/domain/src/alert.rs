// Rust guideline compliant 2026-08-01

//! Normalized alerts, aggregation buckets, snapshots, and the aggregated
//! alert produced once per bucket flush.

use chrono::{DateTime, Utc};

use crate::envelope::AlertEnvelope;
use crate::score::ScoreBreakdown;

/// An alert after field normalization (§4.3). Pure, deterministic output of
/// the normalizer: `RawAlert -> NormalizedAlert`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAlert {
    /// Pass-through event id, or a derived SHA-256 digest when absent.
    pub raw_id: String,
    pub timestamp: DateTime<Utc>,
    pub sip: String,
    pub dip: String,
    /// Lower-cased transport protocol.
    pub proto: String,
    pub rule_name: String,
    pub log_type: String,
    /// Canonicalized URI path with query values and common identifier shapes
    /// replaced by placeholders.
    pub uri_template: String,
    /// Clamped to `[0, 1]`.
    pub severity: f64,
    /// Clamped to `[0, 1]`.
    pub confidence: f64,
    pub src_external: bool,
    pub dst_sensitive: bool,
    /// The original, unmodified alert payload.
    pub raw: AlertEnvelope,
}

impl NormalizedAlert {
    /// `sip|dip|proto|rule_name|log_type|uri_template`, per §3's invariant
    /// that the key depends only on these six fields.
    #[must_use]
    pub fn bucket_key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.sip, self.dip, self.proto, self.rule_name, self.log_type, self.uri_template
        )
    }
}

/// In-memory accumulation unit for alerts sharing a bucket key over a sliding
/// window (`_BucketState` in the Python original).
#[derive(Debug, Clone, PartialEq)]
pub struct BucketState {
    pub bucket_key: String,
    pub sip: String,
    pub dip: String,
    pub proto: String,
    pub rule_name: String,
    pub log_type: String,
    pub uri_template: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub count: u64,
    pub sum_severity: f64,
    pub sum_confidence: f64,
    pub external_count: u64,
    pub sensitive_count: u64,
    /// Raw alert of the latest-timestamped event seen so far.
    pub representative: AlertEnvelope,
    representative_ts: DateTime<Utc>,
    /// Bounded to `max_ref_ids`: oldest kept, later arrivals dropped.
    pub raw_ref_ids: Vec<String>,
    max_ref_ids: usize,
}

impl BucketState {
    /// Start a new bucket from its first alert.
    #[must_use]
    pub fn new(alert: &NormalizedAlert, max_ref_ids: usize) -> Self {
        let mut raw_ref_ids = Vec::with_capacity(max_ref_ids.min(8));
        if max_ref_ids > 0 {
            raw_ref_ids.push(alert.raw_id.clone());
        }
        Self {
            bucket_key: alert.bucket_key(),
            sip: alert.sip.clone(),
            dip: alert.dip.clone(),
            proto: alert.proto.clone(),
            rule_name: alert.rule_name.clone(),
            log_type: alert.log_type.clone(),
            uri_template: alert.uri_template.clone(),
            window_start: alert.timestamp,
            window_end: alert.timestamp,
            count: 1,
            sum_severity: alert.severity,
            sum_confidence: alert.confidence,
            external_count: u64::from(alert.src_external),
            sensitive_count: u64::from(alert.dst_sensitive),
            representative: alert.raw.clone(),
            representative_ts: alert.timestamp,
            raw_ref_ids,
            max_ref_ids,
        }
    }

    /// Fold another alert sharing this bucket's key into the running state.
    pub fn add(&mut self, alert: &NormalizedAlert) {
        debug_assert_eq!(alert.bucket_key(), self.bucket_key);

        self.count += 1;
        self.sum_severity += alert.severity;
        self.sum_confidence += alert.confidence;
        self.external_count += u64::from(alert.src_external);
        self.sensitive_count += u64::from(alert.dst_sensitive);

        if alert.timestamp < self.window_start {
            self.window_start = alert.timestamp;
        }
        if alert.timestamp > self.window_end {
            self.window_end = alert.timestamp;
        }
        if alert.timestamp >= self.representative_ts {
            self.representative = alert.raw.clone();
            self.representative_ts = alert.timestamp;
        }
        if self.raw_ref_ids.len() < self.max_ref_ids {
            self.raw_ref_ids.push(alert.raw_id.clone());
        }
    }

    /// Whether `wall_now - window_end >= window_s`, per §4.3's flush policy.
    #[must_use]
    pub fn is_expired(&self, wall_now: DateTime<Utc>, window_s: i64) -> bool {
        (wall_now - self.window_end).num_seconds() >= window_s
    }

    /// Freeze this bucket into an immutable [`Snapshot`].
    #[must_use]
    pub fn to_snapshot(&self) -> Snapshot {
        let count_f = self.count as f64;
        Snapshot {
            bucket_key: self.bucket_key.clone(),
            sip: self.sip.clone(),
            dip: self.dip.clone(),
            proto: self.proto.clone(),
            rule_name: self.rule_name.clone(),
            log_type: self.log_type.clone(),
            uri_template: self.uri_template.clone(),
            window_start: self.window_start,
            window_end: self.window_end,
            count: self.count,
            avg_severity: self.sum_severity / count_f,
            avg_confidence: self.sum_confidence / count_f,
            external_ratio: self.external_count as f64 / count_f,
            sensitive_ratio: self.sensitive_count as f64 / count_f,
            representative: self.representative.clone(),
            raw_ref_ids: self.raw_ref_ids.clone(),
        }
    }
}

/// Frozen view of a bucket at flush time. Ratios are always in `[0, 1]`
/// because each ratio's numerator is bounded by its denominator (`count`).
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub bucket_key: String,
    pub sip: String,
    pub dip: String,
    pub proto: String,
    pub rule_name: String,
    pub log_type: String,
    pub uri_template: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub count: u64,
    pub avg_severity: f64,
    pub avg_confidence: f64,
    pub external_ratio: f64,
    pub sensitive_ratio: f64,
    pub representative: AlertEnvelope,
    pub raw_ref_ids: Vec<String>,
}

impl Snapshot {
    /// Window duration in whole seconds, floored at 1 per the scorer's
    /// `duration_s = max(window_end - window_start, 1)`.
    #[must_use]
    pub fn duration_s(&self) -> i64 {
        (self.window_end - self.window_start).num_seconds().max(1)
    }
}

/// The external JSON representation of a snapshot plus its risk score
/// (§3's `AggregatedAlert`).
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedAlert {
    pub sip: String,
    pub dip: String,
    pub proto: String,
    pub rule_name: String,
    pub log_type: String,
    pub uri_template: String,
    pub reference_uuids: Vec<String>,
    pub aggregated_count: u64,
    /// Epoch seconds.
    pub first_seen: i64,
    /// Epoch seconds.
    pub last_seen: i64,
    pub risk_scores: ScoreBreakdown,
}

impl AggregatedAlert {
    #[must_use]
    pub fn from_snapshot(snapshot: &Snapshot, risk_scores: ScoreBreakdown) -> Self {
        Self {
            sip: snapshot.sip.clone(),
            dip: snapshot.dip.clone(),
            proto: snapshot.proto.clone(),
            rule_name: snapshot.rule_name.clone(),
            log_type: snapshot.log_type.clone(),
            uri_template: snapshot.uri_template.clone(),
            reference_uuids: snapshot.raw_ref_ids.clone(),
            aggregated_count: snapshot.count,
            first_seen: snapshot.window_start.timestamp(),
            last_seen: snapshot.window_end.timestamp(),
            risk_scores,
        }
    }

    /// Serialize into the queue envelope shape documented in §6: the field
    /// set from §3 tagged with `module`/`version`.
    #[must_use]
    pub fn to_envelope(&self) -> AlertEnvelope {
        let mut envelope = AlertEnvelope::default();
        envelope.set("sip", self.sip.clone().into());
        envelope.set("dip", self.dip.clone().into());
        envelope.set("proto", self.proto.clone().into());
        envelope.set("rule_name", self.rule_name.clone().into());
        envelope.set("log_type", self.log_type.clone().into());
        envelope.set("uri_template", self.uri_template.clone().into());
        envelope.set("reference_uuids", self.reference_uuids.clone().into());
        envelope.set("aggregated_count", self.aggregated_count.into());
        envelope.set("first_seen", self.first_seen.into());
        envelope.set("last_seen", self.last_seen.into());
        envelope.set("risk_scores", self.risk_scores.to_json());
        envelope.set("module", "module_aggregation_filtering".into());
        envelope.set("version", 1.into());
        envelope
    }

    /// Reconstruct from a previously-serialized envelope. Returns `None` when
    /// a required field is missing or malformed.
    #[must_use]
    pub fn from_envelope(envelope: &AlertEnvelope) -> Option<Self> {
        let s = |k: &str| envelope.get(k)?.as_str().map(str::to_owned);
        let reference_uuids = envelope
            .get("reference_uuids")?
            .as_array()?
            .iter()
            .filter_map(|v| v.as_str().map(str::to_owned))
            .collect();
        Some(Self {
            sip: s("sip")?,
            dip: s("dip")?,
            proto: s("proto")?,
            rule_name: s("rule_name")?,
            log_type: s("log_type")?,
            uri_template: s("uri_template")?,
            reference_uuids,
            aggregated_count: envelope.get("aggregated_count")?.as_u64()?,
            first_seen: envelope.get("first_seen")?.as_i64()?,
            last_seen: envelope.get("last_seen")?.as_i64()?,
            risk_scores: ScoreBreakdown::from_json(envelope.get("risk_scores")?)?,
        })
    }

    /// Synthesize a single raw alert from this aggregate's own fields, used
    /// by Module 2 when no raw alerts are recoverable from the index
    /// (`_build_fallback_raw_alert` in the Python original).
    #[must_use]
    pub fn to_fallback_raw_alert(&self) -> AlertEnvelope {
        let mut envelope = AlertEnvelope::default();
        envelope.set("sip", self.sip.clone().into());
        envelope.set("dip", self.dip.clone().into());
        envelope.set("proto", self.proto.clone().into());
        envelope.set("rule_name", self.rule_name.clone().into());
        envelope.set("log_type", self.log_type.clone().into());
        envelope.set("uri_template", self.uri_template.clone().into());
        envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn alert_at(secs: i64, sip: &str) -> NormalizedAlert {
        NormalizedAlert {
            raw_id: format!("id-{secs}"),
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            sip: sip.to_owned(),
            dip: "10.0.0.5".to_owned(),
            proto: "tcp".to_owned(),
            rule_name: "SQLi".to_owned(),
            log_type: "waf".to_owned(),
            uri_template: "/api/item/<NUM>".to_owned(),
            severity: 0.8,
            confidence: 0.7,
            src_external: true,
            dst_sensitive: false,
            raw: AlertEnvelope::default(),
        }
    }

    #[test]
    fn bucket_key_ignores_other_fields() {
        let a = alert_at(0, "1.1.1.1");
        let mut b = alert_at(100, "1.1.1.1");
        b.severity = 0.1;
        b.confidence = 0.2;
        assert_eq!(a.bucket_key(), b.bucket_key());
    }

    #[test]
    fn bucket_window_ordering_and_ref_id_cap() {
        let first = alert_at(10, "1.1.1.1");
        let mut bucket = BucketState::new(&first, 2);
        bucket.add(&alert_at(0, "1.1.1.1"));
        bucket.add(&alert_at(20, "1.1.1.1"));
        bucket.add(&alert_at(5, "1.1.1.1"));

        assert!(bucket.window_start <= bucket.window_end);
        assert!(bucket.raw_ref_ids.len() <= 2);
        assert_eq!(bucket.count, 4);
    }

    #[test]
    fn representative_is_latest_timestamp() {
        let first = alert_at(10, "1.1.1.1");
        let mut bucket = BucketState::new(&first, 8);
        let mut later = alert_at(50, "1.1.1.1");
        later.raw.clone_from(&{
            let mut e = AlertEnvelope::default();
            e.set("marker", "latest".into());
            e
        });
        bucket.add(&later);
        assert_eq!(bucket.representative.get("marker").and_then(|v| v.as_str()), Some("latest"));
    }

    #[test]
    fn aggregated_alert_envelope_roundtrip() {
        let snapshot_alert = alert_at(0, "1.1.1.1");
        let bucket = BucketState::new(&snapshot_alert, 8);
        let snapshot = bucket.to_snapshot();
        let scores = ScoreBreakdown {
            s_freq: 0.1,
            s_rule: 0.2,
            s_ctx: 0.3,
            s_rare: 0.4,
            final_score: 42.5,
            risk_level: crate::score::RiskLevel::Medium,
        };
        let aggregated = AggregatedAlert::from_snapshot(&snapshot, scores);
        let envelope = aggregated.to_envelope();
        let back = AggregatedAlert::from_envelope(&envelope).unwrap();
        assert_eq!(aggregated, back);
    }
}
