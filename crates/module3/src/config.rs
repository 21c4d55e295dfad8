//! Reasoning-loop knobs (`ReasonerConfig` in the Python original). Model
//! location, device placement, and upstream endpoint addresses are adapter
//! concerns owned by `socrates`, not this pipeline-logic crate.

/// Errors from an invalid [`Module3Config`].
#[derive(Debug, thiserror::Error)]
pub enum Module3ConfigError {
    #[error("invalid module3 configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// Bounds on the tool-use loop and the manual-review confidence gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Module3Config {
    pub max_tool_iterations: usize,
    pub tool_result_max_items: usize,
    pub manual_review_confidence_threshold: f64,
}

impl Default for Module3Config {
    fn default() -> Self {
        Self { max_tool_iterations: 8, tool_result_max_items: 30, manual_review_confidence_threshold: 0.55 }
    }
}

/// Builder for [`Module3Config`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Module3ConfigBuilder(Module3Config);

impl Module3Config {
    #[must_use]
    pub fn builder() -> Module3ConfigBuilder {
        Module3ConfigBuilder(Self::default())
    }
}

impl Module3ConfigBuilder {
    #[must_use]
    pub fn max_tool_iterations(mut self, max_tool_iterations: usize) -> Self {
        self.0.max_tool_iterations = max_tool_iterations;
        self
    }

    #[must_use]
    pub fn tool_result_max_items(mut self, tool_result_max_items: usize) -> Self {
        self.0.tool_result_max_items = tool_result_max_items;
        self
    }

    #[must_use]
    pub fn manual_review_confidence_threshold(mut self, manual_review_confidence_threshold: f64) -> Self {
        self.0.manual_review_confidence_threshold = manual_review_confidence_threshold;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Module3ConfigError::InvalidConfig`] when `max_tool_iterations`
    /// or `tool_result_max_items` is zero, or when
    /// `manual_review_confidence_threshold` is outside `[0, 1]`.
    pub fn build(self) -> Result<Module3Config, Module3ConfigError> {
        if self.0.max_tool_iterations == 0 {
            return Err(Module3ConfigError::InvalidConfig { reason: "max_tool_iterations must be positive".to_owned() });
        }
        if self.0.tool_result_max_items == 0 {
            return Err(Module3ConfigError::InvalidConfig { reason: "tool_result_max_items must be positive".to_owned() });
        }
        if !(0.0..=1.0).contains(&self.0.manual_review_confidence_threshold) {
            return Err(Module3ConfigError::InvalidConfig {
                reason: "manual_review_confidence_threshold must be in [0, 1]".to_owned(),
            });
        }
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Module3Config::builder().build().unwrap();
        assert_eq!(cfg.max_tool_iterations, 8);
        assert_eq!(cfg.tool_result_max_items, 30);
        assert_eq!(cfg.manual_review_confidence_threshold, 0.55);
    }

    #[test]
    fn zero_iterations_is_rejected() {
        assert!(Module3Config::builder().max_tool_iterations(0).build().is_err());
    }
}
