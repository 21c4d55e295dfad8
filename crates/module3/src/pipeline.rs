//! Pops an alert awaiting investigation, runs the reasoning loop, and routes
//! the result to manual review or the final output queue
//! (`ContextEnhancedLLMPipeline` in the Python original).

use domain::{AlertEnvelope, ExternalTools, InternalTools, LlmClient, QueueError, QueueRead, QueueWrite};

use crate::config::Module3Config;
use crate::prompts::PromptBundle;
use crate::reasoner::InvestigationReasoner;

/// Errors surfaced while running the investigation stage.
#[derive(Debug, thiserror::Error)]
pub enum Module3Error {
    #[error("queue error: {0}")]
    Queue(QueueError),
}

/// Investigates each popped alert with the LLM reasoning loop and routes it
/// to manual review or the final output queue.
#[derive(Debug, Clone)]
pub struct InvestigationPipeline {
    config: Module3Config,
    reasoner: InvestigationReasoner,
}

impl InvestigationPipeline {
    #[must_use]
    pub fn new(config: Module3Config, prompts: PromptBundle) -> Self {
        Self { config, reasoner: InvestigationReasoner::new(config, prompts) }
    }

    /// Investigate one alert and tag it with `module3_investigation`.
    ///
    /// Returns the tagged envelope plus whether it should go to manual
    /// review (`verdict == "INCONCLUSIVE"` or confidence below the
    /// configured threshold, §4.6).
    pub async fn investigate_one<L, I, E>(&self, llm: &L, internal: &I, external: &E, envelope: &AlertEnvelope) -> (AlertEnvelope, bool)
    where
        L: LlmClient,
        I: InternalTools,
        E: ExternalTools,
    {
        let verdict = self.reasoner.investigate(llm, internal, external, envelope).await;
        let needs_manual_review =
            verdict.verdict == "INCONCLUSIVE" || verdict.confidence < self.config.manual_review_confidence_threshold;

        let mut output = envelope.clone();
        output.set("module3_investigation", verdict.to_json());
        output.set("module", "module_context_enhanced_llm".into());
        output.set("version", 1.into());

        (output, needs_manual_review)
    }

    /// Drive the stage until the input queue signals [`QueueError::Closed`].
    ///
    /// # Errors
    ///
    /// Returns [`Module3Error::Queue`] for any input or output-queue error
    /// other than a clean `Closed` stop.
    pub async fn run<Q, L, I, E, OutQ, ManQ>(
        &self,
        input: &Q,
        llm: &L,
        internal: &I,
        external: &E,
        output: &OutQ,
        manual_review: &ManQ,
    ) -> Result<(), Module3Error>
    where
        Q: QueueRead,
        L: LlmClient,
        I: InternalTools,
        E: ExternalTools,
        OutQ: QueueWrite,
        ManQ: QueueWrite,
    {
        use std::time::Duration;

        loop {
            let popped = match input.pop(Duration::from_secs(1)).await {
                Ok(Some(envelope)) => envelope,
                Ok(None) => continue,
                Err(QueueError::Closed) => {
                    log::info!("module3.run.stopped: queue closed");
                    return Ok(());
                }
                Err(e @ QueueError::Decode(_)) => {
                    log::warn!("module3.run.drop_malformed: error={e}");
                    continue;
                }
            };

            let (routed, needs_manual_review) = self.investigate_one(llm, internal, external, &popped).await;
            if needs_manual_review {
                manual_review.push(routed).await.map_err(Module3Error::Queue)?;
            } else {
                output.push(routed).await.map_err(Module3Error::Queue)?;
            }
        }
    }
}
