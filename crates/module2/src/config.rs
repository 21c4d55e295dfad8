//! Decision threshold and fetch batching for the business-logic matcher
//! (`ModelConfig`/`ElasticConfig` in the Python original).

/// Errors from an invalid [`Module2Config`].
#[derive(Debug, thiserror::Error)]
pub enum Module2ConfigError {
    #[error("invalid module2 configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// Decision threshold and the minimum instance count required before a
/// bucket can be ruled a business false positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Module2Config {
    pub decision_threshold: f64,
    pub min_instance_count: usize,
    pub fetch_batch_size: usize,
}

impl Default for Module2Config {
    fn default() -> Self {
        Self { decision_threshold: 0.72, min_instance_count: 2, fetch_batch_size: 200 }
    }
}

/// Builder for [`Module2Config`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Module2ConfigBuilder(Module2Config);

impl Module2Config {
    #[must_use]
    pub fn builder() -> Module2ConfigBuilder {
        Module2ConfigBuilder(Self::default())
    }
}

impl Module2ConfigBuilder {
    #[must_use]
    pub fn decision_threshold(mut self, decision_threshold: f64) -> Self {
        self.0.decision_threshold = decision_threshold;
        self
    }

    #[must_use]
    pub fn min_instance_count(mut self, min_instance_count: usize) -> Self {
        self.0.min_instance_count = min_instance_count;
        self
    }

    #[must_use]
    pub fn fetch_batch_size(mut self, fetch_batch_size: usize) -> Self {
        self.0.fetch_batch_size = fetch_batch_size;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Module2ConfigError::InvalidConfig`] when `decision_threshold`
    /// is outside `[0, 1]`, `min_instance_count` is zero, or
    /// `fetch_batch_size` is zero.
    pub fn build(self) -> Result<Module2Config, Module2ConfigError> {
        if !(0.0..=1.0).contains(&self.0.decision_threshold) {
            return Err(Module2ConfigError::InvalidConfig {
                reason: "decision_threshold must be in [0, 1]".to_owned(),
            });
        }
        if self.0.min_instance_count == 0 {
            return Err(Module2ConfigError::InvalidConfig { reason: "min_instance_count must be positive".to_owned() });
        }
        if self.0.fetch_batch_size == 0 {
            return Err(Module2ConfigError::InvalidConfig { reason: "fetch_batch_size must be positive".to_owned() });
        }
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Module2Config::builder().build().unwrap();
        assert_eq!(cfg.decision_threshold, 0.72);
        assert_eq!(cfg.min_instance_count, 2);
        assert_eq!(cfg.fetch_batch_size, 200);
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        assert!(Module2Config::builder().decision_threshold(1.5).build().is_err());
    }
}
