// Rust guideline compliant 2026-08-01

//! Deployment entry point wiring the four pipeline-logic crates to concrete
//! adapters: `receiver` (raw alert ingestion), `module1` (aggregation and
//! risk scoring), `module2` (business-logic matcher), and `module3`
//! (investigation reasoning).
//!
//! # Usage
//!
//! ```text
//! RUST_LOG=info cargo run --bin socrates -- run-all --config socrates.json
//! ```
//!
//! `run-all` wires every stage against its own in-memory queue and runs
//! until `Ctrl+C`, cascading queue closure downstream exactly like the
//! single-pipeline demo this binary's adapters are modeled on. The
//! per-stage subcommands (`run-receiver`, `run-module1`, ...) run one stage
//! in isolation against freshly created queues -- useful for exercising one
//! adapter set at a time, though nothing upstream will ever publish into
//! them outside of `run-all` since these are in-memory, single-process
//! queues rather than a shared broker.

mod adapters;
mod config;

use std::path::PathBuf;
use std::time::Duration;

use adapters::{
    ArtifactBusinessMatcherModel, ElasticAlertSource, ElasticInternalTools, ElasticRawAlertFetcher, EsClient, HttpExternalTools, HttpLlmClient,
    InMemoryHistoryStore, InMemoryQueue, JsonAssetCatalog, LogIndices,
};
use anyhow::Context as _;
use clap::{Parser, Subcommand};
use config::SocratesConfig;
use module1::{AggregationPipeline, Module1Config};
use module2::{BusinessMatcherPipeline, Module2Config};
use module3::{InvestigationPipeline, Module3Config, PromptBundle};
use receiver::{Receiver, ReceiverConfig};
use tracing::Instrument as _;

#[derive(Debug, Parser)]
#[command(name = "socrates", about = "Security-alert triage pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run every stage together, wired queue-to-queue, until Ctrl+C.
    RunAll {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run only the raw-alert receiver.
    RunReceiver {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run only the aggregation and risk-scoring stage.
    RunModule1 {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run only the business-logic matcher stage.
    RunModule2 {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run only the investigation-reasoning stage.
    RunModule3 {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Out of scope: training the business matcher model is a separate,
    /// offline process (feature extraction plus a fitted classifier); this
    /// crate only ever loads a trained artifact.
    TrainModule2 {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<SocratesConfig> {
    match path {
        Some(path) => config::SocratesConfig::load(&path).with_context(|| format!("failed to load config from {}", path.display())),
        None => {
            tracing::warn!("config.missing: no --config given, using documented defaults");
            Ok(SocratesConfig::default())
        }
    }
}

fn build_es_client(cfg: &SocratesConfig) -> EsClient {
    EsClient::new(cfg.elastic.base_url(), cfg.elastic.timeout())
}

fn build_asset_catalog(cfg: &SocratesConfig) -> anyhow::Result<JsonAssetCatalog> {
    JsonAssetCatalog::load(std::path::Path::new(&cfg.asset_catalog.path)).context("failed to load asset catalog")
}

fn build_business_model(cfg: &SocratesConfig) -> anyhow::Result<ArtifactBusinessMatcherModel> {
    ArtifactBusinessMatcherModel::from_artifact(std::path::Path::new(&cfg.business_model.artifact_path))
        .context("business matcher artifact is required to start module2")
}

fn build_internal_tools(cfg: &SocratesConfig, es: EsClient) -> ElasticInternalTools {
    let indices = LogIndices {
        waf: cfg.elastic.waf_index.clone(),
        tianyan: cfg.elastic.tianyan_index.clone(),
        zhongzi: cfg.elastic.zhongzi_index.clone(),
        nginx: cfg.elastic.nginx_index.clone(),
        huorong: cfg.elastic.huorong_index.clone(),
    };
    ElasticInternalTools::new(es, cfg.elastic.default_size, indices, cfg.cmdb.base_url.clone(), cfg.cmdb.api_key.clone(), Duration::from_secs(cfg.cmdb.timeout_s))
}

fn build_external_tools(cfg: &SocratesConfig) -> HttpExternalTools {
    HttpExternalTools::new(
        cfg.external.virustotal_base_url.clone(),
        cfg.external.virustotal_api_key.clone(),
        cfg.external.cve_base_url.clone(),
        cfg.external.cve_api_key.clone(),
        Duration::from_secs(cfg.external.timeout_s),
    )
}

fn build_llm_client(cfg: &SocratesConfig) -> HttpLlmClient {
    HttpLlmClient::new(cfg.llm.base_url.clone(), Duration::from_secs(cfg.llm.timeout_s))
}

async fn run_receiver_stage(cfg: &SocratesConfig, raw_queue: &InMemoryQueue) -> anyhow::Result<()> {
    let source = ElasticAlertSource::new(build_es_client(cfg), cfg.elastic.raw_index.clone(), cfg.elastic.default_size);
    let receiver_config = ReceiverConfig::builder().poll_interval(Duration::from_secs(cfg.receiver_poll_interval_s)).build().context("invalid receiver config")?;
    let receiver = Receiver::new(receiver_config);
    receiver.run(&source, raw_queue).await.context("receiver stage failed")
}

async fn run_module1_stage(
    cfg: &SocratesConfig,
    input: &InMemoryQueue,
    output: &InMemoryQueue,
    suppressed: &InMemoryQueue,
) -> anyhow::Result<()> {
    let module1_config: Module1Config = cfg.module1_config()?;
    let catalog = build_asset_catalog(cfg)?;
    let history = InMemoryHistoryStore::new(cfg.history_days);
    let mut pipeline = AggregationPipeline::new(module1_config);
    pipeline.run(input, &catalog, &history, output, suppressed).await.context("module1 stage failed")
}

async fn run_module2_stage(
    cfg: &SocratesConfig,
    input: &InMemoryQueue,
    output: &InMemoryQueue,
    suppressed: &InMemoryQueue,
) -> anyhow::Result<()> {
    let module2_config: Module2Config = cfg.module2_config()?;
    let fetcher = ElasticRawAlertFetcher::new(build_es_client(cfg), cfg.elastic.raw_index.clone());
    let model = build_business_model(cfg)?;
    let pipeline = BusinessMatcherPipeline::new(module2_config);
    pipeline.run(input, &fetcher, &model, output, suppressed).await.context("module2 stage failed")
}

async fn run_module3_stage(
    cfg: &SocratesConfig,
    input: &InMemoryQueue,
    output: &InMemoryQueue,
    manual_review: &InMemoryQueue,
) -> anyhow::Result<()> {
    let module3_config: Module3Config = cfg.module3_config()?;
    let llm = build_llm_client(cfg);
    let es = build_es_client(cfg);
    let internal = build_internal_tools(cfg, es);
    let external = build_external_tools(cfg);
    let pipeline = InvestigationPipeline::new(module3_config, PromptBundle::default());
    pipeline.run(input, &llm, &internal, &external, output, manual_review).await.context("module3 stage failed")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    match cli.command {
        Command::RunAll { config } => run_all(load_config(config)?).await,
        Command::RunReceiver { config } => {
            let cfg = load_config(config)?;
            let raw = InMemoryQueue::new(cfg.queues.raw_key.clone(), None);
            tokio::select! {
                _ = tokio::signal::ctrl_c() => { raw.close(); Ok(()) }
                result = run_receiver_stage(&cfg, &raw) => result,
            }
        }
        Command::RunModule1 { config } => {
            let cfg = load_config(config)?;
            let input = InMemoryQueue::new(cfg.queues.raw_key.clone(), None);
            let output = InMemoryQueue::new(cfg.queues.aggregated_key.clone(), None);
            let suppressed = InMemoryQueue::new(cfg.queues.aggregation_suppressed_key.clone(), None);
            tokio::select! {
                _ = tokio::signal::ctrl_c() => { input.close(); Ok(()) }
                result = run_module1_stage(&cfg, &input, &output, &suppressed) => result,
            }
        }
        Command::RunModule2 { config } => {
            let cfg = load_config(config)?;
            let input = InMemoryQueue::new(cfg.queues.aggregated_key.clone(), None);
            let output = InMemoryQueue::new(cfg.queues.investigation_key.clone(), None);
            let suppressed = InMemoryQueue::new(cfg.queues.business_suppressed_key.clone(), None);
            tokio::select! {
                _ = tokio::signal::ctrl_c() => { input.close(); Ok(()) }
                result = run_module2_stage(&cfg, &input, &output, &suppressed) => result,
            }
        }
        Command::RunModule3 { config } => {
            let cfg = load_config(config)?;
            let input = InMemoryQueue::new(cfg.queues.investigation_key.clone(), None);
            let output = InMemoryQueue::new(cfg.queues.final_key.clone(), None);
            let manual_review = InMemoryQueue::new(cfg.queues.manual_review_key.clone(), None);
            tokio::select! {
                _ = tokio::signal::ctrl_c() => { input.close(); Ok(()) }
                result = run_module3_stage(&cfg, &input, &output, &manual_review) => result,
            }
        }
        Command::TrainModule2 { config: _ } => {
            tracing::info!("train_module2.out_of_scope: this crate only loads a trained business-matcher artifact, it does not fit one");
            Ok(())
        }
    }
}

/// Wires all four stages queue-to-queue and runs them concurrently.
///
/// Shutdown cascades forward from the raw-alert queue: closing `raw` lets
/// the receiver finish, which lets module1 finish and close its own output
/// queues, and so on down the chain.
async fn run_all(cfg: SocratesConfig) -> anyhow::Result<()> {
    let raw = InMemoryQueue::new(cfg.queues.raw_key.clone(), None);
    let aggregated = InMemoryQueue::new(cfg.queues.aggregated_key.clone(), None);
    let aggregation_suppressed = InMemoryQueue::new(cfg.queues.aggregation_suppressed_key.clone(), None);
    let investigation = InMemoryQueue::new(cfg.queues.investigation_key.clone(), None);
    let business_suppressed = InMemoryQueue::new(cfg.queues.business_suppressed_key.clone(), None);
    let final_queue = InMemoryQueue::new(cfg.queues.final_key.clone(), None);
    let manual_review = InMemoryQueue::new(cfg.queues.manual_review_key.clone(), None);

    let receiver_then_close = async {
        let r = run_receiver_stage(&cfg, &raw).await;
        raw.close();
        r
    };

    let module1_then_close = async {
        let r = run_module1_stage(&cfg, &raw, &aggregated, &aggregation_suppressed).await;
        aggregated.close();
        aggregation_suppressed.close();
        r
    };

    let module2_then_close = async {
        let r = run_module2_stage(&cfg, &aggregated, &investigation, &business_suppressed).await;
        investigation.close();
        business_suppressed.close();
        r
    };

    let module3_then_close = async {
        let r = run_module3_stage(&cfg, &investigation, &final_queue, &manual_review).await;
        final_queue.close();
        manual_review.close();
        r
    };

    let pipeline = async {
        let (r, m1, m2, m3) = tokio::join!(
            receiver_then_close.instrument(tracing::info_span!("receiver")),
            module1_then_close.instrument(tracing::info_span!("module1")),
            module2_then_close.instrument(tracing::info_span!("module2")),
            module3_then_close.instrument(tracing::info_span!("module3")),
        );
        r.context("receiver failed").and(m1.context("module1 failed")).and(m2.context("module2 failed")).and(m3.context("module3 failed"))
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("main.shutdown: ctrl_c received, closing raw queue");
            raw.close();
        }
        result = pipeline => {
            result?;
        }
    }

    Ok(())
}
