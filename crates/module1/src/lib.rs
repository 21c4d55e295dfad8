// Rust guideline compliant 2026-08-01

//! Aggregation and risk-scoring stage (§4.3): normalizes raw alerts, buckets
//! them by `sip|dip|proto|rule_name|log_type|uri_template`, and on idle
//! flush scores and routes each bucket to a high-priority output queue or a
//! low-priority suppressed queue.
//!
//! Entry point: [`AggregationPipeline`]. Configuration via
//! [`Module1Config::builder`].

mod aggregator;
mod config;
mod normalizer;
mod pipeline;
mod scorer;

pub use aggregator::{Aggregator, normalize_frequency};
pub use config::{AggregationConfig, Module1Config, Module1ConfigBuilder, Module1ConfigError};
pub use normalizer::AlertNormalizer;
pub use pipeline::{AggregationPipeline, Module1Error};
pub use scorer::{RiskScorer, ScoringConfig};
