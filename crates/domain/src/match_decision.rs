// Rust guideline compliant 2026-08-01

//! Module 2's per-alert decision (§3 `MatchDecision`, §4.4).

use serde_json::{Value, json};

use crate::score::round4;

/// Business-false-positive decision for one aggregated alert.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchDecision {
    pub aggregate_score: f64,
    pub threshold: f64,
    pub min_instance_count: usize,
    pub instance_scores: Vec<f64>,
    pub fetched_instance_count: usize,
    pub is_business_false_positive: bool,
}

impl MatchDecision {
    /// `score = 0.5*p95 + 0.3*mean + 0.2*hit_ratio`; BFP iff
    /// `len(scores) >= min_instance_count && aggregate >= threshold`.
    #[must_use]
    pub fn compute(instance_scores: Vec<f64>, threshold: f64, min_instance_count: usize, fetched_instance_count: usize) -> Self {
        let aggregate_score = if instance_scores.is_empty() {
            0.0
        } else {
            let p95 = percentile_95(&instance_scores);
            let mean = instance_scores.iter().sum::<f64>() / instance_scores.len() as f64;
            let hit_ratio = instance_scores.iter().filter(|&&s| s >= threshold).count() as f64 / instance_scores.len() as f64;
            0.5 * p95 + 0.3 * mean + 0.2 * hit_ratio
        };
        let is_business_false_positive = instance_scores.len() >= min_instance_count && aggregate_score >= threshold;
        Self {
            aggregate_score,
            threshold,
            min_instance_count,
            instance_scores,
            fetched_instance_count,
            is_business_false_positive,
        }
    }

    /// Serialize as the `module2_business_match` object attached to the
    /// queue envelope (§4.4 step 6).
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "aggregate_score": round4(self.aggregate_score),
            "threshold": self.threshold,
            "min_instance_count": self.min_instance_count,
            "instance_scores": self.instance_scores.iter().copied().map(round4).collect::<Vec<_>>(),
            "is_business_false_positive": self.is_business_false_positive,
            "fetched_instance_count": self.fetched_instance_count,
        })
    }
}

/// 95th percentile over an unsorted sample, linearly interpolated between
/// the two nearest ranks (numpy's default `method="linear"`).
fn percentile_95(scores: &[f64]) -> f64 {
    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = 0.95 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_false_positive_scenario() {
        let decision = MatchDecision::compute(vec![0.95, 0.9, 0.85, 0.8], 0.7, 3, 4);
        assert!((decision.aggregate_score - 0.9375).abs() < 1e-9);
        assert!(decision.is_business_false_positive);
    }

    #[test]
    fn below_min_instance_count_is_not_bfp() {
        let decision = MatchDecision::compute(vec![0.95, 0.9], 0.7, 3, 2);
        assert!(!decision.is_business_false_positive);
    }

    #[test]
    fn empty_instance_scores_is_never_bfp() {
        let decision = MatchDecision::compute(vec![], 0.1, 1, 0);
        assert_eq!(decision.aggregate_score, 0.0);
        assert!(!decision.is_business_false_positive);
    }

    #[test]
    fn percentile_95_interpolates_linearly_between_ranks() {
        // Nearest-rank would give p95([0.0, 1.0]) = 1.0; linear interpolation
        // (numpy's default) gives 0.95. mean = 0.5, hit_ratio = 1/2 = 0.5.
        let decision = MatchDecision::compute(vec![0.0, 1.0], 0.5, 1, 2);
        let expected = 0.5 * 0.95 + 0.3 * 0.5 + 0.2 * 0.5;
        assert!((decision.aggregate_score - expected).abs() < 1e-9);
    }
}
