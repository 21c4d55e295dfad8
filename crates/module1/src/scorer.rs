//! Weighted risk scoring (`LightweightRiskScorer` in the Python original):
//! four `[0, 1]` subscores combined and squashed onto `[0, 100]`.

use domain::{AssetProfile, RiskLevel, ScoreBreakdown, Snapshot};

const STRONG_RULE_KEYWORDS: &[&str] = &["rce", "remote code", "deserialization", "sql", "sqli", "command injection"];
const MEDIUM_RULE_KEYWORDS: &[&str] = &["xss", "ssrf", "path traversal", "upload", "shell", "webattack"];

/// Scoring weights and decision threshold (`ScoringConfig` in the Python
/// original).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    pub threshold: f64,
    pub w_freq: f64,
    pub w_rule: f64,
    pub w_ctx: f64,
    pub w_rare: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self { threshold: 50.0, w_freq: 0.35, w_rule: 0.25, w_ctx: 0.20, w_rare: 0.20 }
    }
}

/// Stateless scorer applying a fixed [`ScoringConfig`].
#[derive(Debug)]
pub struct RiskScorer {
    cfg: ScoringConfig,
}

impl RiskScorer {
    #[must_use]
    pub fn new(cfg: ScoringConfig) -> Self {
        Self { cfg }
    }

    #[must_use]
    pub fn score(&self, snapshot: &Snapshot, historical_daily_avg: f64, asset_profile: AssetProfile) -> ScoreBreakdown {
        let s_freq = Self::frequency_score(snapshot.count, snapshot.duration_s());
        let s_rule = Self::rule_score(snapshot.avg_severity, snapshot.avg_confidence, &snapshot.rule_name, &snapshot.log_type);
        let s_ctx = Self::context_score(snapshot.external_ratio, snapshot.sensitive_ratio, asset_profile);
        let s_rare = Self::rarity_score(historical_daily_avg);

        let weighted_sum =
            self.cfg.w_freq * s_freq + self.cfg.w_rule * s_rule + self.cfg.w_ctx * s_ctx + self.cfg.w_rare * s_rare;
        let final_score = Self::squash(weighted_sum);

        ScoreBreakdown {
            s_freq,
            s_rule,
            s_ctx,
            s_rare,
            final_score,
            risk_level: RiskLevel::from_final_score(final_score),
        }
    }

    #[must_use]
    pub fn is_high_priority(&self, score: &ScoreBreakdown) -> bool {
        score.final_score >= self.cfg.threshold
    }

    fn frequency_score(count: u64, duration_s: i64) -> f64 {
        let base = crate::aggregator::normalize_frequency(count);
        let burst = ((count as f64 / duration_s as f64) / 2.0).clamp(0.0, 1.0);
        (0.6 * base + 0.4 * burst).clamp(0.0, 1.0)
    }

    fn rule_score(severity: f64, confidence: f64, rule_name: &str, log_type: &str) -> f64 {
        let keyword_weight = Self::rule_keyword_weight(rule_name, log_type);
        (0.45 * severity + 0.35 * confidence + 0.20 * keyword_weight).clamp(0.0, 1.0)
    }

    fn context_score(src_external_ratio: f64, dst_sensitive_ratio: f64, asset_profile: AssetProfile) -> f64 {
        let sensitive_flag = if asset_profile.sensitive { 1.0 } else { 0.0 };
        let combined_sensitive = dst_sensitive_ratio.max(sensitive_flag);
        (0.40 * src_external_ratio + 0.30 * asset_profile.criticality + 0.20 * asset_profile.exposure + 0.10 * combined_sensitive)
            .clamp(0.0, 1.0)
    }

    fn rarity_score(historical_daily_avg: f64) -> f64 {
        (1.0 / (1.0 + (historical_daily_avg + 1.0).ln())).clamp(0.0, 1.0)
    }

    fn squash(value: f64) -> f64 {
        let normalized = 1.0 / (1.0 + (-7.0 * (value - 0.5)).exp());
        normalized * 100.0
    }

    fn rule_keyword_weight(rule_name: &str, log_type: &str) -> f64 {
        let text = format!("{rule_name} {log_type}").to_lowercase();
        if STRONG_RULE_KEYWORDS.iter().any(|kw| text.contains(kw)) {
            0.95
        } else if MEDIUM_RULE_KEYWORDS.iter().any(|kw| text.contains(kw)) {
            0.75
        } else {
            0.45
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use domain::AlertEnvelope;

    fn snapshot(count: u64, rule_name: &str) -> Snapshot {
        Snapshot {
            bucket_key: "k".to_owned(),
            sip: "1.1.1.1".to_owned(),
            dip: "10.0.0.5".to_owned(),
            proto: "tcp".to_owned(),
            rule_name: rule_name.to_owned(),
            log_type: "waf".to_owned(),
            uri_template: "/api".to_owned(),
            window_start: Utc.timestamp_opt(0, 0).unwrap(),
            window_end: Utc.timestamp_opt(60, 0).unwrap(),
            count,
            avg_severity: 0.9,
            avg_confidence: 0.8,
            external_ratio: 1.0,
            sensitive_ratio: 0.0,
            representative: AlertEnvelope::default(),
            raw_ref_ids: vec![],
        }
    }

    #[test]
    fn high_severity_sqli_against_critical_asset_scores_high_priority() {
        let scorer = RiskScorer::new(ScoringConfig::default());
        let profile = AssetProfile { criticality: 0.9, exposure: 0.7, sensitive: true };
        let breakdown = scorer.score(&snapshot(20, "SQL Injection"), 0.0, profile);
        assert!(scorer.is_high_priority(&breakdown));
        assert!(matches!(breakdown.risk_level, RiskLevel::High | RiskLevel::Critical));
    }

    #[test]
    fn low_volume_benign_rule_against_internal_asset_scores_low() {
        let scorer = RiskScorer::new(ScoringConfig::default());
        let snap = Snapshot { avg_severity: 0.1, avg_confidence: 0.1, external_ratio: 0.0, ..snapshot(1, "heartbeat") };
        let profile = AssetProfile { criticality: 0.2, exposure: 0.1, sensitive: false };
        let breakdown = scorer.score(&snap, 50.0, profile);
        assert!(breakdown.final_score < scorer.cfg.threshold);
    }

    #[test]
    fn squash_midpoint_maps_to_fifty() {
        assert!((RiskScorer::squash(0.5) - 50.0).abs() < 1e-9);
    }
}
