//! # State Machine Error Types
//!
//! Structured errors for illegal transition attempts, kept separate from the
//! crate-level error so the store can report exactly which write was refused.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateMachineError {
    #[error("Invalid transition from {from} on event {event}")]
    InvalidTransition { from: String, event: String },

    #[error("Internal state machine error: {0}")]
    Internal(String),
}

pub type StateMachineResult<T> = std::result::Result<T, StateMachineError>;
