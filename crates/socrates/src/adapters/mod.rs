//! Concrete adapters wiring the [`domain`] ports to Elasticsearch, plain
//! HTTP endpoints, and in-memory demo storage. Swapping a backend (e.g.
//! trading [`history_store::InMemoryHistoryStore`] for a Redis-backed one)
//! only touches the adapter file; pipeline crates never change.

pub mod alert_source;
pub mod asset_catalog;
pub mod business_model;
pub mod elastic_client;
pub mod external_tools;
pub mod history_store;
pub mod internal_tools;
pub mod llm_client;
pub mod queue;
pub mod raw_fetcher;

pub use alert_source::ElasticAlertSource;
pub use asset_catalog::JsonAssetCatalog;
pub use business_model::ArtifactBusinessMatcherModel;
pub use elastic_client::EsClient;
pub use external_tools::HttpExternalTools;
pub use history_store::InMemoryHistoryStore;
pub use internal_tools::{ElasticInternalTools, LogIndices};
pub use llm_client::HttpLlmClient;
pub use queue::InMemoryQueue;
pub use raw_fetcher::ElasticRawAlertFetcher;
