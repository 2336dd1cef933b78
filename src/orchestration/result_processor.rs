//! # Processor Result Loop
//!
//! Single consumer of the dispatcher's results queue. Each report is routed
//! to the matching orchestrator callback; a report that fails orchestration
//! is logged and dropped rather than wedging the loop, so one bad flow never
//! stalls every other flow sharing the queue.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::orchestrator::EventFlowOrchestrator;
use crate::dispatcher::{ProcessorExecutionStatus, ProcessorResultMessage};
use crate::models::FailureDetail;

pub struct ResultProcessor {
    orchestrator: Arc<EventFlowOrchestrator>,
    results_rx: mpsc::UnboundedReceiver<ProcessorResultMessage>,
}

impl ResultProcessor {
    pub fn new(
        orchestrator: Arc<EventFlowOrchestrator>,
        results_rx: mpsc::UnboundedReceiver<ProcessorResultMessage>,
    ) -> Self {
        Self {
            orchestrator,
            results_rx,
        }
    }

    /// Consume result messages until every sender is dropped
    pub async fn run(mut self) {
        info!("Result processor loop started");
        while let Some(message) = self.results_rx.recv().await {
            self.process(message).await;
        }
        info!("Result processor loop stopped, results queue closed");
    }

    async fn process(&self, message: ProcessorResultMessage) {
        debug!(
            flow_id = %message.flow_id,
            processor = %message.processor,
            status = ?message.status,
            attempt = message.attempt,
            execution_time_ms = message.execution_time_ms,
            correlation_id = %message.correlation_id,
            "Processing result message"
        );

        let ProcessorResultMessage {
            flow_id,
            processor,
            status,
            result,
            error,
            ..
        } = message;

        let failure = || {
            error
                .clone()
                .unwrap_or_else(|| FailureDetail::new("processor failed without detail", None))
        };

        let outcome = match status {
            ProcessorExecutionStatus::Success => {
                self.orchestrator
                    .submit_result(flow_id, processor, result.unwrap_or_default(), error.clone())
                    .await
            }
            ProcessorExecutionStatus::Critical => {
                self.orchestrator
                    .submit_error(flow_id, processor, failure(), true)
                    .await
            }
            ProcessorExecutionStatus::Retriable => self
                .orchestrator
                .submit_retriable_error(flow_id, processor, failure()),
            ProcessorExecutionStatus::RetriesExhausted => {
                self.orchestrator
                    .handle_retries_exhausted(flow_id, processor, failure())
                    .await
            }
        };

        if let Err(e) = outcome {
            error!(
                flow_id = %flow_id,
                processor = %processor,
                error = %e,
                "Failed to process result message"
            );
        }
    }
}
