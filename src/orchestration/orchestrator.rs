//! # Event-Flow Orchestrator
//!
//! Reactive coordinator for one deployment: starts flows, reacts to
//! processor results, unlocks dependents the moment their last dependency
//! lands, and routes failures through the termination path. The orchestrator
//! never polls and never sleeps; every piece of work is triggered by an
//! inbound callback.
//!
//! ## Concurrency Model
//!
//! Every state mutation runs under the flow's store lock: the completion
//! write, the dependent readiness scan and the flow-completion check are one
//! atomic step. Dispatcher submissions happen after the lock is released so
//! processor execution never blocks orchestration.

use chrono::Utc;
use futures::future::try_join_all;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::discovery::{claim_dispatchable, DispatchableProcessor};
use super::finalizer::finalize_if_complete;
use crate::config::EventFlowConfig;
use crate::constants::events;
use crate::dispatcher::{DispatchMessage, DispatchMetadata, TaskDispatcher};
use crate::error::{EventFlowError, Result};
use crate::events::EventPublisher;
use crate::models::{FailureDetail, Flow, FlowId, ProcessorStateRecord, ResultMap, RootArguments};
use crate::processor::ProcessorId;
use crate::registry::DagRegistry;
use crate::state_machine::{FlowState, ProcessorEvent, ProcessorStatus};
use crate::store::{FlowSnapshot, InMemoryRunStateStore};

/// Work computed under the flow lock, executed after it is released
struct LockOutcome {
    claimed: Vec<DispatchableProcessor>,
    finalized: Option<FlowState>,
    root_arguments: RootArguments,
}

pub struct EventFlowOrchestrator {
    store: Arc<InMemoryRunStateStore>,
    dags: Arc<DagRegistry>,
    dispatcher: Arc<dyn TaskDispatcher>,
    publisher: EventPublisher,
    max_attempts: u32,
}

impl EventFlowOrchestrator {
    pub fn new(
        store: Arc<InMemoryRunStateStore>,
        dags: Arc<DagRegistry>,
        dispatcher: Arc<dyn TaskDispatcher>,
        publisher: EventPublisher,
        config: &EventFlowConfig,
    ) -> Self {
        Self {
            store,
            dags,
            dispatcher,
            publisher,
            max_attempts: config.dispatcher.max_attempts,
        }
    }

    /// Start a new evaluation run
    ///
    /// Creates the flow record plus one PENDING row per declared processor,
    /// then claims and dispatches every root processor with empty inputs.
    /// Fails without creating any state when the flow type is unregistered.
    #[instrument(skip(self, root_arguments), fields(flow_type = %flow_type))]
    pub async fn start_new_eventflow(
        &self,
        flow_type: &str,
        root_arguments: RootArguments,
        initiated_by: &str,
    ) -> Result<FlowId> {
        let dag = self.dags.get_dag(flow_type)?;

        let flow = Flow::new(flow_type, root_arguments.clone(), initiated_by);
        let flow_id = flow.id;
        self.store.create_flow(flow, dag.processors())?;

        let claimed = self
            .store
            .update(flow_id, |run| claim_dispatchable(run, dag, Utc::now()))?
            .map_err(EventFlowError::from)?;

        info!(
            flow_id = %flow_id,
            flow_type = %flow_type,
            initiated_by = %initiated_by,
            root_count = claimed.len(),
            "Started new event flow"
        );
        self.publisher.publish(
            events::FLOW_STARTED,
            json!({
                "flow_id": flow_id.to_string(),
                "flow_type": flow_type,
                "initiated_by": initiated_by,
            }),
        );

        self.publish_discovery(flow_id, &claimed);
        self.dispatch_claimed(flow_id, &root_arguments, claimed)
            .await?;
        Ok(flow_id)
    }

    /// Record a processor completion and advance the flow
    ///
    /// A recorded `error` marks the degraded fallback path. Duplicate or late
    /// completions (for example after the processor was force-aborted) are
    /// logged and ignored; the first write wins.
    #[instrument(skip(self, result, error), fields(flow_id = %flow_id, processor = %processor))]
    pub async fn submit_result(
        &self,
        flow_id: FlowId,
        processor: ProcessorId,
        result: ResultMap,
        error: Option<FailureDetail>,
    ) -> Result<()> {
        let degraded = error.is_some();
        let outcome = self
            .store
            .update(flow_id, |run| -> Result<Option<LockOutcome>> {
                let dag = self.dags.get_dag(&run.flow.flow_type)?;
                let record = run.record_mut(processor).ok_or_else(|| {
                    EventFlowError::OrchestrationError(format!(
                        "processor {processor} is not part of flow {flow_id}"
                    ))
                })?;

                let now = Utc::now();
                if let Err(e) = record.apply(ProcessorEvent::Complete { result, error }, now) {
                    warn!(error = %e, "Ignoring completion for non-active processor");
                    return Ok(None);
                }

                let claimed = claim_dispatchable(run, dag, now)?;
                let finalized = finalize_if_complete(run, now);
                Ok(Some(LockOutcome {
                    claimed,
                    finalized,
                    root_arguments: run.flow.root_arguments.clone(),
                }))
            })??;

        let Some(outcome) = outcome else {
            return Ok(());
        };

        let event = if degraded {
            events::PROCESSOR_COMPLETED_WITH_ERROR
        } else {
            events::PROCESSOR_COMPLETED
        };
        self.publisher.publish(
            event,
            json!({
                "flow_id": flow_id.to_string(),
                "processor": processor.to_string(),
            }),
        );

        self.publish_discovery(flow_id, &outcome.claimed);
        self.dispatch_claimed(flow_id, &outcome.root_arguments, outcome.claimed)
            .await?;
        self.publish_finalization(flow_id, outcome.finalized);
        Ok(())
    }

    /// Record a processor failure
    ///
    /// With `abort_flow` set the failure is treated as critical: the failing
    /// processor is aborted, every still-PENDING processor is force-aborted
    /// so it can never dispatch, and the flow's termination processor is
    /// dispatched exactly once. Without it the failure is transient
    /// bookkeeping; the dispatcher keeps owning the retry loop.
    #[instrument(skip(self, detail), fields(flow_id = %flow_id, processor = %processor))]
    pub async fn submit_error(
        &self,
        flow_id: FlowId,
        processor: ProcessorId,
        detail: FailureDetail,
        abort_flow: bool,
    ) -> Result<()> {
        if !abort_flow {
            return self.record_retriable_error(flow_id, processor, detail);
        }
        self.abort_and_terminate(
            flow_id,
            processor,
            ProcessorEvent::Abort(Some(detail)),
            events::PROCESSOR_ABORTED,
        )
        .await
    }

    /// Record a transient failure without affecting flow routing
    pub fn submit_retriable_error(
        &self,
        flow_id: FlowId,
        processor: ProcessorId,
        detail: FailureDetail,
    ) -> Result<()> {
        self.record_retriable_error(flow_id, processor, detail)
    }

    /// Mark a processor permanently failed after its retry budget ran out
    ///
    /// The row lands in ERROR rather than ABORTED, so the finalized flow
    /// reports ERROR, but the routing is the same as a critical failure: the
    /// remaining PENDING processors are aborted and the termination processor
    /// runs.
    #[instrument(skip(self, detail), fields(flow_id = %flow_id, processor = %processor))]
    pub async fn handle_retries_exhausted(
        &self,
        flow_id: FlowId,
        processor: ProcessorId,
        detail: FailureDetail,
    ) -> Result<()> {
        self.abort_and_terminate(
            flow_id,
            processor,
            ProcessorEvent::ExhaustRetries(detail),
            events::PROCESSOR_RETRIES_EXHAUSTED,
        )
        .await
    }

    /// Read-only view of one run for reporting consumers
    pub fn flow_snapshot(&self, flow_id: FlowId) -> Result<FlowSnapshot> {
        self.store.snapshot(flow_id)
    }

    fn record_retriable_error(
        &self,
        flow_id: FlowId,
        processor: ProcessorId,
        detail: FailureDetail,
    ) -> Result<()> {
        self.store.update(flow_id, |run| {
            let Some(record) = run.record_mut(processor) else {
                return;
            };
            if let Err(e) = record.apply(ProcessorEvent::RetriableFail(detail), Utc::now()) {
                warn!(
                    flow_id = %flow_id,
                    processor = %processor,
                    error = %e,
                    "Ignoring retriable failure for non-active processor"
                );
            }
        })?;

        self.publisher.publish(
            events::PROCESSOR_RETRIABLE_ERROR,
            json!({
                "flow_id": flow_id.to_string(),
                "processor": processor.to_string(),
            }),
        );
        Ok(())
    }

    async fn abort_and_terminate(
        &self,
        flow_id: FlowId,
        processor: ProcessorId,
        event: ProcessorEvent,
        event_name: &'static str,
    ) -> Result<()> {
        struct AbortOutcome {
            dispatch_termination: Option<ProcessorId>,
            finalized: Option<FlowState>,
            root_arguments: RootArguments,
        }

        let outcome = self
            .store
            .update(flow_id, |run| -> Result<Option<AbortOutcome>> {
                let dag = self.dags.get_dag(&run.flow.flow_type)?;
                let termination = dag.termination_processor();
                let now = Utc::now();

                let record = run.record_mut(processor).ok_or_else(|| {
                    EventFlowError::OrchestrationError(format!(
                        "processor {processor} is not part of flow {flow_id}"
                    ))
                })?;
                if let Err(e) = record.apply(event, now) {
                    warn!(error = %e, "Ignoring failure report for non-active processor");
                    return Ok(None);
                }

                // Pending rows can no longer run; their dependencies will
                // never all complete
                let pending: Vec<ProcessorId> = run
                    .processors
                    .iter()
                    .filter(|(_, r)| r.status == ProcessorStatus::Pending)
                    .map(|(id, _)| *id)
                    .collect();
                for id in pending {
                    if let Some(rec) = run.record_mut(id) {
                        rec.apply(ProcessorEvent::Abort(None), now)?;
                    }
                }

                // The termination row exists only once the abort path has
                // triggered; its absence is the exactly-once dispatch guard
                let dispatch_termination = if run.record(termination).is_none() {
                    let mut rec = ProcessorStateRecord::new(termination);
                    rec.apply(ProcessorEvent::Dispatch, now)?;
                    run.processors.insert(termination, rec);
                    Some(termination)
                } else {
                    None
                };

                let finalized = finalize_if_complete(run, now);
                Ok(Some(AbortOutcome {
                    dispatch_termination,
                    finalized,
                    root_arguments: run.flow.root_arguments.clone(),
                }))
            })??;

        let Some(outcome) = outcome else {
            return Ok(());
        };

        self.publisher.publish(
            event_name,
            json!({
                "flow_id": flow_id.to_string(),
                "processor": processor.to_string(),
            }),
        );

        if let Some(termination) = outcome.dispatch_termination {
            info!(
                flow_id = %flow_id,
                termination = %termination,
                failed_processor = %processor,
                "Dispatching termination processor"
            );
            self.dispatch_claimed(
                flow_id,
                &outcome.root_arguments,
                vec![DispatchableProcessor {
                    processor: termination,
                    inputs: Default::default(),
                }],
            )
            .await?;
            self.publisher.publish(
                events::TERMINATION_DISPATCHED,
                json!({
                    "flow_id": flow_id.to_string(),
                    "termination_processor": termination.to_string(),
                }),
            );
        }

        self.publish_finalization(flow_id, outcome.finalized);
        Ok(())
    }

    async fn dispatch_claimed(
        &self,
        flow_id: FlowId,
        root_arguments: &RootArguments,
        claimed: Vec<DispatchableProcessor>,
    ) -> Result<()> {
        let submissions = claimed.into_iter().map(|item| {
            let metadata = DispatchMetadata {
                max_attempts: self.max_attempts,
                queue: self.dags.queue_for(item.processor).to_string(),
                ..DispatchMetadata::default()
            };
            let message =
                DispatchMessage::new(flow_id, item.processor, item.inputs, root_arguments.clone())
                    .with_metadata(metadata);
            async move {
                let processor = message.processor;
                self.dispatcher.submit(message).await?;
                Ok::<_, EventFlowError>(processor)
            }
        });

        for processor in try_join_all(submissions).await? {
            self.publisher.publish(
                events::PROCESSOR_DISPATCHED,
                json!({
                    "flow_id": flow_id.to_string(),
                    "processor": processor.to_string(),
                }),
            );
        }
        Ok(())
    }

    fn publish_discovery(&self, flow_id: FlowId, claimed: &[DispatchableProcessor]) {
        if claimed.is_empty() {
            return;
        }
        self.publisher.publish(
            events::DISPATCHABLE_PROCESSORS_DISCOVERED,
            json!({
                "flow_id": flow_id.to_string(),
                "processors": claimed
                    .iter()
                    .map(|c| c.processor.to_string())
                    .collect::<Vec<_>>(),
            }),
        );
    }

    fn publish_finalization(&self, flow_id: FlowId, finalized: Option<FlowState>) {
        let Some(state) = finalized else {
            return;
        };
        let event = match state {
            FlowState::Completed => events::FLOW_COMPLETED,
            FlowState::Error => events::FLOW_FAILED,
            _ => events::FLOW_ABORTED,
        };
        self.publisher.publish(
            event,
            json!({
                "flow_id": flow_id.to_string(),
                "status": state.to_string(),
            }),
        );
    }
}
