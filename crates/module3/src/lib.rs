// Rust guideline compliant 2026-08-01

//! Investigation-reasoning stage (§4.5, §4.6): plans a handful of retrieval
//! tool calls for each alert awaiting investigation, runs them through the
//! internal/external tool ports, summarizes each result, and asks the LLM
//! for a final verdict. Routes to manual review when the verdict is
//! inconclusive or under-confident, otherwise to the final output queue.
//!
//! Entry point: [`InvestigationPipeline`]. Configuration via
//! [`Module3Config::builder`].

mod config;
mod orchestrator;
mod pipeline;
mod prompts;
mod reasoner;
mod tool_registry;

pub use config::{Module3Config, Module3ConfigBuilder, Module3ConfigError};
pub use orchestrator::RetrievalOrchestrator;
pub use pipeline::{InvestigationPipeline, Module3Error};
pub use prompts::{DEFAULT_FINAL_PROMPT, DEFAULT_PLANNING_PROMPT, DEFAULT_SYSTEM_PROMPT, DEFAULT_TOOL_SUMMARY_PROMPT, PromptBundle};
pub use reasoner::{InvestigationReasoner, alert_brief};
pub use tool_registry::{ToolSpec, build_tool_specs, tool_specs_json};
