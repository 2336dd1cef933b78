//! # In-Memory Run State Store
//!
//! Process-local implementation of the run state store. A `DashMap` shards
//! flows; each flow's state sits behind its own `parking_lot::Mutex`, giving
//! row-level isolation between flows and atomic read-modify-write within one
//! flow. Cascade-delete semantics fall out of the layout: dropping the flow
//! entry drops every processor row with it.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

use super::{FlowRun, FlowSnapshot};
use crate::error::{EventFlowError, Result};
use crate::models::{Flow, FlowId, ProcessorStateRecord};
use crate::processor::ProcessorId;

#[derive(Default)]
pub struct InMemoryRunStateStore {
    runs: DashMap<FlowId, Arc<Mutex<FlowRun>>>,
}

impl InMemoryRunStateStore {
    pub fn new() -> Self {
        Self {
            runs: DashMap::new(),
        }
    }

    /// Create the flow record plus one PENDING row per declared processor
    ///
    /// Every processor has a tracked row before anything is dispatched; the
    /// unique (flow, processor) constraint is the map key.
    pub fn create_flow(
        &self,
        flow: Flow,
        processors: impl IntoIterator<Item = ProcessorId>,
    ) -> Result<()> {
        let flow_id = flow.id;
        let run = FlowRun {
            flow,
            processors: processors
                .into_iter()
                .map(|id| (id, ProcessorStateRecord::new(id)))
                .collect(),
        };

        match self.runs.entry(flow_id) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(EventFlowError::StoreError(
                format!("flow {flow_id} already exists"),
            )),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                debug!(flow_id = %flow_id, "Created flow run state");
                entry.insert(Arc::new(Mutex::new(run)));
                Ok(())
            }
        }
    }

    /// Run a closure under the flow's lock
    ///
    /// All orchestration writes go through here, so "mark complete, claim
    /// dependents, recheck completion" is a single atomic step.
    pub fn update<R>(&self, flow_id: FlowId, f: impl FnOnce(&mut FlowRun) -> R) -> Result<R> {
        let run = self.handle(flow_id)?;
        let mut guard = run.lock();
        Ok(f(&mut guard))
    }

    /// Immutable snapshot for reporting consumers
    pub fn snapshot(&self, flow_id: FlowId) -> Result<FlowSnapshot> {
        let run = self.handle(flow_id)?;
        let guard = run.lock();
        Ok(FlowSnapshot {
            flow: guard.flow.clone(),
            processors: guard.processors.clone(),
        })
    }

    pub fn processor_state(
        &self,
        flow_id: FlowId,
        processor: ProcessorId,
    ) -> Result<Option<ProcessorStateRecord>> {
        let run = self.handle(flow_id)?;
        let guard = run.lock();
        Ok(guard.processors.get(&processor).cloned())
    }

    pub fn contains(&self, flow_id: FlowId) -> bool {
        self.runs.contains_key(&flow_id)
    }

    /// Drop a flow and, with it, every processor row it owns
    pub fn delete_flow(&self, flow_id: FlowId) -> Result<()> {
        self.runs
            .remove(&flow_id)
            .map(|_| ())
            .ok_or_else(|| EventFlowError::StoreError(format!("flow {flow_id} not found")))
    }

    fn handle(&self, flow_id: FlowId) -> Result<Arc<Mutex<FlowRun>>> {
        self.runs
            .get(&flow_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| EventFlowError::StoreError(format!("flow {flow_id} not found")))
    }
}
