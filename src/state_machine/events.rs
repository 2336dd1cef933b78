use serde::{Deserialize, Serialize};

use crate::models::{FailureDetail, ResultMap};

/// Events that can trigger processor state transitions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ProcessorEvent {
    /// Claim the processor for execution and hand it to the task dispatcher
    Dispatch,
    /// Report a result; a recorded error marks the degraded fallback path
    Complete {
        result: ResultMap,
        error: Option<FailureDetail>,
    },
    /// Report a transient failure; the dispatcher will retry the same processor
    RetriableFail(FailureDetail),
    /// Short-circuit on a critical failure, or force-abort a pending
    /// processor when the termination path triggers
    Abort(Option<FailureDetail>),
    /// Mark the processor permanently failed after its retry budget ran out
    ExhaustRetries(FailureDetail),
}

impl ProcessorEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Dispatch => "dispatch",
            Self::Complete { .. } => "complete",
            Self::RetriableFail(_) => "retriable_fail",
            Self::Abort(_) => "abort",
            Self::ExhaustRetries(_) => "exhaust_retries",
        }
    }
}
