//! Pipeline-level configuration for the aggregation and scoring stage
//! (`AggregationConfig`/`ScoringConfig` in the Python original).

use std::time::Duration;

use crate::scorer::ScoringConfig;

/// Errors from an invalid [`Module1Config`].
#[derive(Debug, thiserror::Error)]
pub enum Module1ConfigError {
    #[error("invalid module1 configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// Aggregation window, flush cadence, and history retention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregationConfig {
    pub window_s: i64,
    pub flush_interval: Duration,
    pub max_ref_ids: usize,
    pub history_days: i64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            window_s: 300,
            flush_interval: Duration::from_secs(1),
            max_ref_ids: 200,
            history_days: 14,
        }
    }
}

/// Full stage configuration: aggregation window plus scoring weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Module1Config {
    pub aggregation: AggregationConfig,
    pub scoring: ScoringConfig,
}

/// Builder for [`Module1Config`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Module1ConfigBuilder {
    aggregation: AggregationConfig,
    scoring: ScoringConfig,
}

impl Module1Config {
    #[must_use]
    pub fn builder() -> Module1ConfigBuilder {
        Module1ConfigBuilder { aggregation: AggregationConfig::default(), scoring: ScoringConfig::default() }
    }
}

impl Module1ConfigBuilder {
    #[must_use]
    pub fn window_s(mut self, window_s: i64) -> Self {
        self.aggregation.window_s = window_s;
        self
    }

    #[must_use]
    pub fn flush_interval(mut self, flush_interval: Duration) -> Self {
        self.aggregation.flush_interval = flush_interval;
        self
    }

    #[must_use]
    pub fn max_ref_ids(mut self, max_ref_ids: usize) -> Self {
        self.aggregation.max_ref_ids = max_ref_ids;
        self
    }

    #[must_use]
    pub fn history_days(mut self, history_days: i64) -> Self {
        self.aggregation.history_days = history_days;
        self
    }

    #[must_use]
    pub fn scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Module1ConfigError::InvalidConfig`] when `window_s` or
    /// `max_ref_ids` is zero, or when `history_days` is negative.
    pub fn build(self) -> Result<Module1Config, Module1ConfigError> {
        if self.aggregation.window_s <= 0 {
            return Err(Module1ConfigError::InvalidConfig { reason: "window_s must be positive".to_owned() });
        }
        if self.aggregation.max_ref_ids == 0 {
            return Err(Module1ConfigError::InvalidConfig { reason: "max_ref_ids must be positive".to_owned() });
        }
        if self.aggregation.history_days < 0 {
            return Err(Module1ConfigError::InvalidConfig { reason: "history_days must not be negative".to_owned() });
        }
        Ok(Module1Config { aggregation: self.aggregation, scoring: self.scoring })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Module1Config::builder().build().unwrap();
        assert_eq!(cfg.aggregation.window_s, 300);
        assert_eq!(cfg.aggregation.max_ref_ids, 200);
        assert_eq!(cfg.aggregation.history_days, 14);
        assert_eq!(cfg.scoring.threshold, 50.0);
    }

    #[test]
    fn zero_window_is_rejected() {
        assert!(Module1Config::builder().window_s(0).build().is_err());
    }
}
