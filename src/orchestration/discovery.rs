//! # Dispatchable Processor Discovery
//!
//! Incremental readiness scan run after every completion write, under the
//! flow's lock. A processor becomes dispatchable the moment its last upstream
//! dependency reaches a completion state; claiming it (PENDING to
//! IN_PROGRESS) happens in the same locked scan, so two concurrent
//! completions can never both claim the same processor.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

use crate::models::ResultMap;
use crate::processor::ProcessorId;
use crate::registry::FlowDag;
use crate::state_machine::{ProcessorEvent, ProcessorStatus, StateMachineError};
use crate::store::FlowRun;

/// A claimed processor together with the inputs it will execute with
#[derive(Debug, Clone)]
pub struct DispatchableProcessor {
    pub processor: ProcessorId,
    /// Result mapping of each upstream dependency, and nothing else
    pub inputs: HashMap<ProcessorId, ResultMap>,
}

/// Find every PENDING processor whose dependencies are all satisfied and
/// claim it in place
///
/// Inputs are gathered from the dependency rows at claim time, so a
/// dependent always sees the exact results (including degraded fallback
/// results) that satisfied its `depends_on` set.
pub fn claim_dispatchable(
    run: &mut FlowRun,
    dag: &FlowDag,
    at: DateTime<Utc>,
) -> Result<Vec<DispatchableProcessor>, StateMachineError> {
    let mut candidates: Vec<ProcessorId> = dag
        .processors()
        .filter(|p| run.status_of(*p) == Some(ProcessorStatus::Pending))
        .filter(|p| {
            dag.depends_on(*p).iter().all(|dep| {
                run.status_of(*dep)
                    .map(|s| s.is_completion())
                    .unwrap_or(false)
            })
        })
        .collect();
    candidates.sort();

    let mut claimed = Vec::with_capacity(candidates.len());
    for processor in candidates {
        let inputs = gather_inputs(run, dag, processor);
        if let Some(record) = run.record_mut(processor) {
            record.apply(ProcessorEvent::Dispatch, at)?;
            debug!(
                flow_id = %run.flow.id,
                processor = %processor,
                dependency_count = inputs.len(),
                "Claimed dispatchable processor"
            );
            claimed.push(DispatchableProcessor { processor, inputs });
        }
    }
    Ok(claimed)
}

fn gather_inputs(
    run: &FlowRun,
    dag: &FlowDag,
    processor: ProcessorId,
) -> HashMap<ProcessorId, ResultMap> {
    dag.depends_on(processor)
        .iter()
        .map(|dep| {
            let result = run
                .record(*dep)
                .and_then(|r| r.result.clone())
                .unwrap_or_default();
            (*dep, result)
        })
        .collect()
}
