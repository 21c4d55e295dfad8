//! Top-level deployment configuration: one JSON document covering every
//! stage's pipeline-logic knobs (§4) plus this binary's adapter endpoints.
//! Mirrors the Python original's per-module `Config.from_env()`, collapsed
//! into a single file read once at startup.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Errors while loading or validating [`SocratesConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("failed to parse config file {path}: {source}")]
    Parse { path: String, source: serde_json::Error },
    #[error("invalid {stage} configuration: {reason}")]
    InvalidStage { stage: &'static str, reason: String },
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct QueueEndpoints {
    pub raw_key: String,
    pub aggregated_key: String,
    pub aggregation_suppressed_key: String,
    pub investigation_key: String,
    pub business_suppressed_key: String,
    pub final_key: String,
    pub manual_review_key: String,
}

impl Default for QueueEndpoints {
    fn default() -> Self {
        Self {
            raw_key: "socrates:alerts:raw".to_owned(),
            aggregated_key: "socrates:alerts:aggregated".to_owned(),
            aggregation_suppressed_key: "socrates:alerts:aggregation_suppressed".to_owned(),
            investigation_key: "socrates:alerts:investigation".to_owned(),
            business_suppressed_key: "socrates:alerts:business_suppressed".to_owned(),
            final_key: "socrates:alerts:final".to_owned(),
            manual_review_key: "socrates:alerts:manual_review".to_owned(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ElasticEndpoint {
    pub host: String,
    pub port: u16,
    pub scheme: String,
    pub timeout_s: u64,
    pub raw_index: String,
    pub waf_index: String,
    pub tianyan_index: String,
    pub zhongzi_index: String,
    pub nginx_index: String,
    pub huorong_index: String,
    pub default_size: u32,
}

impl Default for ElasticEndpoint {
    fn default() -> Self {
        Self {
            host: "10.132.99.60".to_owned(),
            port: 9200,
            scheme: "http".to_owned(),
            timeout_s: 10,
            raw_index: "alerts-*".to_owned(),
            waf_index: "waf-*".to_owned(),
            tianyan_index: "tianyan-alarm-*".to_owned(),
            zhongzi_index: "zhongzi-*".to_owned(),
            nginx_index: "nginx-*".to_owned(),
            huorong_index: "huorong-*".to_owned(),
            default_size: 50,
        }
    }
}

impl ElasticEndpoint {
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_s)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CmdbEndpoint {
    pub base_url: String,
    pub api_key: String,
    pub timeout_s: u64,
}

impl Default for CmdbEndpoint {
    fn default() -> Self {
        Self { base_url: String::new(), api_key: String::new(), timeout_s: 8 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ExternalEndpoints {
    pub virustotal_base_url: String,
    pub virustotal_api_key: String,
    pub cve_base_url: String,
    pub cve_api_key: String,
    pub timeout_s: u64,
}

impl Default for ExternalEndpoints {
    fn default() -> Self {
        Self {
            virustotal_base_url: "https://www.virustotal.com/api/v3".to_owned(),
            virustotal_api_key: String::new(),
            cve_base_url: "https://api.cvesearch.com".to_owned(),
            cve_api_key: String::new(),
            timeout_s: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LlmEndpoint {
    pub base_url: String,
    pub timeout_s: u64,
    pub prompts_dir: String,
}

impl Default for LlmEndpoint {
    fn default() -> Self {
        Self { base_url: "http://127.0.0.1:8000".to_owned(), timeout_s: 60, prompts_dir: "prompts/module_context_enhanced_llm".to_owned() }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AssetCatalogSource {
    pub path: String,
}

impl Default for AssetCatalogSource {
    fn default() -> Self {
        Self { path: "config/asset_catalog.json".to_owned() }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BusinessModelSource {
    pub artifact_path: String,
}

impl Default for BusinessModelSource {
    fn default() -> Self {
        Self { artifact_path: "models/business_self_learning_xgboost.pkl".to_owned() }
    }
}

/// One JSON document's worth of deployment configuration for every stage.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SocratesConfig {
    pub queues: QueueEndpoints,
    pub elastic: ElasticEndpoint,
    pub cmdb: CmdbEndpoint,
    pub external: ExternalEndpoints,
    pub llm: LlmEndpoint,
    pub asset_catalog: AssetCatalogSource,
    pub business_model: BusinessModelSource,
    pub receiver_poll_interval_s: u64,
    pub window_s: i64,
    pub flush_interval_s: f64,
    pub max_ref_ids: usize,
    pub history_days: i64,
    pub scoring_threshold: f64,
    pub decision_threshold: f64,
    pub min_instance_count: usize,
    pub fetch_batch_size: usize,
    pub max_tool_iterations: usize,
    pub tool_result_max_items: usize,
    pub manual_review_confidence_threshold: f64,
}

impl Default for SocratesConfig {
    fn default() -> Self {
        Self {
            queues: QueueEndpoints::default(),
            elastic: ElasticEndpoint::default(),
            cmdb: CmdbEndpoint::default(),
            external: ExternalEndpoints::default(),
            llm: LlmEndpoint::default(),
            asset_catalog: AssetCatalogSource::default(),
            business_model: BusinessModelSource::default(),
            receiver_poll_interval_s: 1,
            window_s: 300,
            flush_interval_s: 1.0,
            max_ref_ids: 200,
            history_days: 14,
            scoring_threshold: 50.0,
            decision_threshold: 0.72,
            min_instance_count: 2,
            fetch_batch_size: 200,
            max_tool_iterations: 8,
            tool_result_max_items: 30,
            manual_review_confidence_threshold: 0.55,
        }
    }
}

impl SocratesConfig {
    /// Load configuration from a JSON file, falling back to documented
    /// defaults for `socrates run-*` invocations with no `--config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`] when `path`
    /// exists but cannot be read or deserialized.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })
    }

    /// Build the [`module1::Module1Config`] this deployment configures.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidStage`] when the derived values fail
    /// validation (e.g. a non-positive `window_s`).
    pub fn module1_config(&self) -> Result<module1::Module1Config, ConfigError> {
        module1::Module1Config::builder()
            .window_s(self.window_s)
            .flush_interval(Duration::from_secs_f64(self.flush_interval_s))
            .max_ref_ids(self.max_ref_ids)
            .history_days(self.history_days)
            .scoring(module1::ScoringConfig { threshold: self.scoring_threshold, ..module1::ScoringConfig::default() })
            .build()
            .map_err(|e| ConfigError::InvalidStage { stage: "module1", reason: e.to_string() })
    }

    /// Build the [`module2::Module2Config`] this deployment configures.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidStage`] when the derived values fail
    /// validation.
    pub fn module2_config(&self) -> Result<module2::Module2Config, ConfigError> {
        module2::Module2Config::builder()
            .decision_threshold(self.decision_threshold)
            .min_instance_count(self.min_instance_count)
            .fetch_batch_size(self.fetch_batch_size)
            .build()
            .map_err(|e| ConfigError::InvalidStage { stage: "module2", reason: e.to_string() })
    }

    /// Build the [`module3::Module3Config`] this deployment configures.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidStage`] when the derived values fail
    /// validation.
    pub fn module3_config(&self) -> Result<module3::Module3Config, ConfigError> {
        module3::Module3Config::builder()
            .max_tool_iterations(self.max_tool_iterations)
            .tool_result_max_items(self.tool_result_max_items)
            .manual_review_confidence_threshold(self.manual_review_confidence_threshold)
            .build()
            .map_err(|e| ConfigError::InvalidStage { stage: "module3", reason: e.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build_valid_stage_configs() {
        let cfg = SocratesConfig::default();
        assert!(cfg.module1_config().is_ok());
        assert!(cfg.module2_config().is_ok());
        assert!(cfg.module3_config().is_ok());
    }

    #[test]
    fn elastic_base_url_combines_scheme_host_port() {
        let elastic = ElasticEndpoint::default();
        assert_eq!(elastic.base_url(), "http://10.132.99.60:9200");
    }
}
