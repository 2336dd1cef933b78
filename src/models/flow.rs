use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::RootArguments;
use crate::state_machine::FlowState;

/// Opaque identifier of one evaluation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowId(Uuid);

impl FlowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FlowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One end-to-end evaluation run
///
/// `status` is derived state: it is recomputed on every processor-state write
/// and flips to a terminal value exactly once, when the last processor row
/// reaches a terminal status. `end_time` and `run_duration_ms` are stamped in
/// that same write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flow {
    pub id: FlowId,
    pub flow_type: String,
    pub root_arguments: RootArguments,
    pub status: FlowState,
    pub initiated_by: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub run_duration_ms: Option<i64>,
}

impl Flow {
    pub fn new(flow_type: impl Into<String>, root_arguments: RootArguments, initiated_by: impl Into<String>) -> Self {
        Self {
            id: FlowId::new(),
            flow_type: flow_type.into(),
            root_arguments,
            status: FlowState::Started,
            initiated_by: initiated_by.into(),
            start_time: Utc::now(),
            end_time: None,
            run_duration_ms: None,
        }
    }

    /// Stamp the terminal status and timing; a no-op if already finalized
    pub fn finalize(&mut self, status: FlowState, at: DateTime<Utc>) {
        if self.end_time.is_some() {
            return;
        }
        self.status = status;
        self.end_time = Some(at);
        self.run_duration_ms = Some((at - self.start_time).num_milliseconds());
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
