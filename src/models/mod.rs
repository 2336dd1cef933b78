//! # Run State Records
//!
//! Data layer for the run state store: one [`Flow`] record per evaluation run
//! and one [`ProcessorStateRecord`] per (flow, processor) pair. The
//! orchestrator is the only writer of both; reporting consumers read
//! immutable snapshots.

pub mod flow;
pub mod processor_state;

use std::collections::HashMap;

pub use flow::{Flow, FlowId};
pub use processor_state::{FailureDetail, ProcessorStateRecord};

/// Result mapping produced by a processor and consumed by its dependents
pub type ResultMap = HashMap<String, serde_json::Value>;

/// Immutable key-value bag of inputs shared by every processor in a flow
pub type RootArguments = HashMap<String, serde_json::Value>;
