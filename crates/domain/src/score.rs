// Rust guideline compliant 2026-08-01

//! The risk-scoring output type (§3 `ScoreBreakdown`, §4.3).

use serde_json::{Value, json};

/// Risk tier assigned from `final_score`, per §4.3's thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// `>=85 CRITICAL, >=70 HIGH, >=45 MEDIUM, else LOW`.
    #[must_use]
    pub fn from_final_score(final_score: f64) -> Self {
        if final_score >= 85.0 {
            Self::Critical
        } else if final_score >= 70.0 {
            Self::High
        } else if final_score >= 45.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            "CRITICAL" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// Four `[0, 1]` subscores plus the `[0, 100]` composite and its tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub s_freq: f64,
    pub s_rule: f64,
    pub s_ctx: f64,
    pub s_rare: f64,
    pub final_score: f64,
    pub risk_level: RiskLevel,
}

impl ScoreBreakdown {
    #[must_use]
    pub fn to_json(self) -> Value {
        json!({
            "frequency": round4(self.s_freq),
            "rule": round4(self.s_rule),
            "context": round4(self.s_ctx),
            "rarity": round4(self.s_rare),
            "final_score": round2(self.final_score),
            "risk_level": self.risk_level.as_str(),
        })
    }

    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        Some(Self {
            s_freq: value.get("frequency")?.as_f64()?,
            s_rule: value.get("rule")?.as_f64()?,
            s_ctx: value.get("context")?.as_f64()?,
            s_rare: value.get("rarity")?.as_f64()?,
            final_score: value.get("final_score")?.as_f64()?,
            risk_level: RiskLevel::parse(value.get("risk_level")?.as_str()?)?,
        })
    }
}

/// Round to 4 decimal places, matching `scorer.py`'s subscore rounding.
#[must_use]
pub fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Round to 2 decimal places, matching `scorer.py`'s `final_score` rounding.
#[must_use]
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_thresholds() {
        assert_eq!(RiskLevel::from_final_score(85.0), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_final_score(70.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_final_score(45.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_final_score(44.9), RiskLevel::Low);
    }

    #[test]
    fn rounding_matches_expected_precision() {
        assert_eq!(round4(0.123_456), 0.1235);
        assert_eq!(round2(42.505), 42.51);
    }
}
