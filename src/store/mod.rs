//! # Run State Store
//!
//! Durable per-run state: one [`Flow`] record plus one
//! [`ProcessorStateRecord`] per declared processor. The store is the single
//! source of truth the orchestrator reads and writes; every mutation runs
//! under a per-flow lock so a completion write, the dependent-claim scan and
//! the "is this the last processor" check are one atomic step and can never
//! race under concurrent completions.

pub mod memory;

use std::collections::HashMap;

use crate::models::{Flow, ProcessorStateRecord};
use crate::processor::ProcessorId;
use crate::state_machine::ProcessorStatus;

pub use memory::InMemoryRunStateStore;

/// Mutable state of one flow, held under the store's per-flow lock
#[derive(Debug, Clone)]
pub struct FlowRun {
    pub flow: Flow,
    pub processors: HashMap<ProcessorId, ProcessorStateRecord>,
}

impl FlowRun {
    pub fn record(&self, id: ProcessorId) -> Option<&ProcessorStateRecord> {
        self.processors.get(&id)
    }

    pub fn record_mut(&mut self, id: ProcessorId) -> Option<&mut ProcessorStateRecord> {
        self.processors.get_mut(&id)
    }

    pub fn status_of(&self, id: ProcessorId) -> Option<ProcessorStatus> {
        self.processors.get(&id).map(|r| r.status)
    }

    /// True when every processor row reached a terminal status
    pub fn all_terminal(&self) -> bool {
        self.processors.values().all(|r| r.status.is_terminal())
    }

    /// True when every processor row reached a completion state
    pub fn all_completion(&self) -> bool {
        self.processors.values().all(|r| r.status.is_completion())
    }

    pub fn any_error(&self) -> bool {
        self.processors
            .values()
            .any(|r| r.status == ProcessorStatus::Error)
    }
}

/// Read-only view handed to reporting/UI consumers
#[derive(Debug, Clone)]
pub struct FlowSnapshot {
    pub flow: Flow,
    pub processors: HashMap<ProcessorId, ProcessorStateRecord>,
}
