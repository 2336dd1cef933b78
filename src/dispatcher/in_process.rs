//! # In-Process Task Dispatcher
//!
//! Tokio-backed implementation of the dispatcher contract. Each submission
//! spawns an independent worker task that resolves the processor
//! implementation, runs it with a retry loop (exponential backoff with a
//! jitter ceiling), and pushes every report onto the results queue consumed
//! by the result processor loop.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::errors::DispatchError;
use super::message::{DispatchMessage, ProcessorExecutionStatus, ProcessorResultMessage};
use super::task_dispatcher::TaskDispatcher;
use crate::config::{BackoffConfig, DispatcherConfig};
use crate::processor::{self, ProcessorContext, ProcessorOutcome};
use crate::registry::ProcessorRegistry;

pub struct InProcessDispatcher {
    registry: Arc<ProcessorRegistry>,
    results_tx: mpsc::UnboundedSender<ProcessorResultMessage>,
    config: DispatcherConfig,
}

impl InProcessDispatcher {
    pub fn new(
        registry: Arc<ProcessorRegistry>,
        results_tx: mpsc::UnboundedSender<ProcessorResultMessage>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            registry,
            results_tx,
            config,
        }
    }

    async fn run_with_retries(
        message: DispatchMessage,
        processor: Arc<dyn crate::processor::Processor>,
        results_tx: mpsc::UnboundedSender<ProcessorResultMessage>,
        backoff: BackoffConfig,
    ) {
        let max_attempts = message.metadata.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let ctx = ProcessorContext {
                flow_id: message.flow_id,
                processor: message.processor,
                inputs: message.inputs.clone(),
                root_arguments: message.root_arguments.clone(),
                attempt,
            };

            let started = Instant::now();
            let outcome = processor::execute(processor.as_ref(), &ctx).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            let report = match outcome {
                ProcessorOutcome::Success(result) => {
                    ProcessorResultMessage::success(&message, result, None, attempt, elapsed_ms)
                }
                ProcessorOutcome::Degraded { result, error } => ProcessorResultMessage::success(
                    &message,
                    result,
                    Some(error),
                    attempt,
                    elapsed_ms,
                ),
                ProcessorOutcome::CriticalFailure(error) => ProcessorResultMessage::failure(
                    &message,
                    ProcessorExecutionStatus::Critical,
                    error,
                    attempt,
                    elapsed_ms,
                ),
                ProcessorOutcome::RetriableFailure(error) => {
                    let status = if attempt == max_attempts {
                        ProcessorExecutionStatus::RetriesExhausted
                    } else {
                        ProcessorExecutionStatus::Retriable
                    };
                    ProcessorResultMessage::failure(&message, status, error, attempt, elapsed_ms)
                }
            };

            let terminal = report.status != ProcessorExecutionStatus::Retriable;
            if results_tx.send(report).is_err() {
                warn!(
                    flow_id = %message.flow_id,
                    processor = %message.processor,
                    "Results queue closed, dropping processor report"
                );
                return;
            }
            if terminal {
                return;
            }

            let delay = backoff_delay(&backoff, attempt);
            debug!(
                flow_id = %message.flow_id,
                processor = %message.processor,
                attempt = attempt,
                delay_ms = delay.as_millis() as u64,
                "Backing off before retry"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl TaskDispatcher for InProcessDispatcher {
    async fn submit(&self, message: DispatchMessage) -> Result<(), DispatchError> {
        let processor = self.registry.get(message.processor).map_err(|_| {
            DispatchError::ProcessorNotRegistered {
                processor: message.processor,
            }
        })?;
        // Fail fast when nothing can consume the reports anymore
        if self.results_tx.is_closed() {
            return Err(DispatchError::ResultsQueueClosed {
                processor: message.processor,
            });
        }

        debug!(
            flow_id = %message.flow_id,
            processor = %message.processor,
            queue = %message.metadata.queue,
            correlation_id = %message.metadata.correlation_id,
            "Submitting processor execution"
        );

        let results_tx = self.results_tx.clone();
        let backoff = self.config.backoff.clone();
        tokio::spawn(Self::run_with_retries(
            message, processor, results_tx, backoff,
        ));
        Ok(())
    }
}

/// Exponential backoff with a capped delay and full jitter on the upper half
fn backoff_delay(config: &BackoffConfig, attempt: u32) -> Duration {
    let exp = config.multiplier.powi(attempt.saturating_sub(1) as i32);
    let base = ((config.initial_delay_ms as f64) * exp) as u64;
    let capped = base.min(config.max_delay_ms).max(1);
    let half = capped / 2;
    Duration::from_millis((half + fastrand::u64(0..=capped - half)).max(1))
}
