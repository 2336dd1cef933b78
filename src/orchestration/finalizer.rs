//! # Flow Finalizer
//!
//! Derives the flow-level terminal status from processor rows and stamps it
//! exactly once. Invoked under the flow's lock after every state write, so
//! the "is this the last processor" check can never race with a concurrent
//! completion.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::state_machine::FlowState;
use crate::store::FlowRun;

/// Terminal flow status implied by the processor rows, if any
///
/// Priority: every row in a completion state means COMPLETED; otherwise a
/// permanently failed row means ERROR; otherwise the flow was aborted.
pub fn terminal_flow_state(run: &FlowRun) -> Option<FlowState> {
    if !run.all_terminal() {
        return None;
    }
    Some(if run.all_completion() {
        FlowState::Completed
    } else if run.any_error() {
        FlowState::Error
    } else {
        FlowState::Aborted
    })
}

/// Finalize the flow if every processor row is terminal
///
/// Returns the terminal state when this call performed the finalization.
/// Idempotent: an already-finalized flow is left untouched.
pub fn finalize_if_complete(run: &mut FlowRun, at: DateTime<Utc>) -> Option<FlowState> {
    if run.flow.is_terminal() {
        return None;
    }
    let state = terminal_flow_state(run)?;
    run.flow.finalize(state, at);
    info!(
        flow_id = %run.flow.id,
        flow_type = %run.flow.flow_type,
        status = %state,
        duration_ms = run.flow.run_duration_ms,
        "Flow finalized"
    );
    Some(state)
}
