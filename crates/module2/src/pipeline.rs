//! Re-hydrates an aggregated alert's member instances and asks the business
//! matcher model whether the bucket is a business false positive
//! (`BusinessSelfLearningPipeline` in the Python original).

use domain::{AggregatedAlert, AlertEnvelope, BusinessMatcherModel, MatchDecision, ModelizerError, QueueError, QueueRead, QueueWrite, RawAlertFetcher};

use crate::config::Module2Config;

/// Errors surfaced while running the business-logic matcher stage.
#[derive(Debug, thiserror::Error)]
pub enum Module2Error {
    #[error("queue error: {0}")]
    Queue(QueueError),
    #[error("business matcher model inference failed: {0}")]
    Model(#[from] ModelizerError),
}

/// Evaluates each aggregated alert against its re-hydrated member instances
/// and routes it to a business-suppressed queue or onward to investigation.
#[derive(Debug)]
pub struct BusinessMatcherPipeline {
    config: Module2Config,
}

impl BusinessMatcherPipeline {
    #[must_use]
    pub fn new(config: Module2Config) -> Self {
        Self { config }
    }

    /// Evaluate a single aggregated-alert envelope.
    ///
    /// Returns `Ok(None)` when `envelope` does not decode as an aggregated
    /// alert (dropped rather than treated as fatal, §7).
    ///
    /// # Errors
    ///
    /// Returns [`Module2Error::Model`] if the business matcher model fails
    /// inference for any re-hydrated instance.
    pub async fn evaluate<F, M>(
        &self,
        envelope: &AlertEnvelope,
        fetcher: &F,
        model: &M,
    ) -> Result<Option<(AlertEnvelope, MatchDecision)>, Module2Error>
    where
        F: RawAlertFetcher,
        M: BusinessMatcherModel,
    {
        let Some(aggregated) = AggregatedAlert::from_envelope(envelope) else {
            log::warn!("module2.evaluate.drop_malformed");
            return Ok(None);
        };

        let mut raw_alerts = fetcher
            .fetch_by_reference_ids(&aggregated.reference_uuids, self.config.fetch_batch_size)
            .await;
        if raw_alerts.is_empty() {
            raw_alerts.push(aggregated.to_fallback_raw_alert());
        }

        let mut instance_scores = Vec::with_capacity(raw_alerts.len());
        for raw_alert in &raw_alerts {
            instance_scores.push(model.predict_proba(raw_alert).await?);
        }

        let decision = MatchDecision::compute(
            instance_scores,
            self.config.decision_threshold,
            self.config.min_instance_count,
            raw_alerts.len(),
        );

        let mut output = envelope.clone();
        output.set("module2_business_match", decision.to_json());
        output.set("module", "module_business_logic_self_learning".into());
        output.set("version", 1.into());

        Ok(Some((output, decision)))
    }

    /// Drive the stage until the input queue signals
    /// [`QueueError::Closed`].
    ///
    /// # Errors
    ///
    /// Returns [`Module2Error::Queue`] for any input or output-queue error
    /// other than a clean `Closed` stop, or [`Module2Error::Model`] if
    /// inference fails.
    pub async fn run<Q, F, M, OutQ, SuppQ>(
        &self,
        input: &Q,
        fetcher: &F,
        model: &M,
        output: &OutQ,
        suppressed: &SuppQ,
    ) -> Result<(), Module2Error>
    where
        Q: QueueRead,
        F: RawAlertFetcher,
        M: BusinessMatcherModel,
        OutQ: QueueWrite,
        SuppQ: QueueWrite,
    {
        use std::time::Duration;

        loop {
            let popped = match input.pop(Duration::from_secs(1)).await {
                Ok(Some(envelope)) => envelope,
                Ok(None) => continue,
                Err(QueueError::Closed) => {
                    log::info!("module2.run.stopped: queue closed");
                    return Ok(());
                }
                Err(e @ QueueError::Decode(_)) => {
                    log::warn!("module2.run.drop_malformed: error={e}");
                    continue;
                }
            };

            let Some((routed, decision)) = self.evaluate(&popped, fetcher, model).await? else {
                continue;
            };

            if decision.is_business_false_positive {
                suppressed.push(routed).await.map_err(Module2Error::Queue)?;
            } else {
                output.push(routed).await.map_err(Module2Error::Queue)?;
            }
        }
    }
}
