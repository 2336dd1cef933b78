//! # Dispatch and Result Messages
//!
//! Message formats exchanged with the task dispatcher: one
//! [`DispatchMessage`] per processor execution request, and one or more
//! [`ProcessorResultMessage`]s flowing back on the results queue (one per
//! attempt for transient failures, exactly one for terminal outcomes).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::constants::system;
use crate::models::{FailureDetail, FlowId, ResultMap, RootArguments};
use crate::processor::ProcessorId;

/// Request to execute one processor for one flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchMessage {
    pub flow_id: FlowId,
    pub processor: ProcessorId,
    /// Result mappings of the processor's upstream dependencies, exactly
    pub inputs: HashMap<ProcessorId, ResultMap>,
    pub root_arguments: RootArguments,
    pub metadata: DispatchMetadata,
}

/// Delivery metadata for a dispatch message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchMetadata {
    pub created_at: DateTime<Utc>,
    /// Maximum execution attempts for this dispatch
    pub max_attempts: u32,
    /// Correlation id for tracing a dispatch through logs
    pub correlation_id: String,
    /// Execution queue this message routes to
    pub queue: String,
}

impl Default for DispatchMetadata {
    fn default() -> Self {
        Self {
            created_at: Utc::now(),
            max_attempts: system::DEFAULT_MAX_ATTEMPTS,
            correlation_id: Uuid::new_v4().to_string(),
            queue: system::DEFAULT_QUEUE.to_string(),
        }
    }
}

impl DispatchMessage {
    pub fn new(
        flow_id: FlowId,
        processor: ProcessorId,
        inputs: HashMap<ProcessorId, ResultMap>,
        root_arguments: RootArguments,
    ) -> Self {
        Self {
            flow_id,
            processor,
            inputs,
            root_arguments,
            metadata: DispatchMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: DispatchMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Terminal or per-attempt status reported back by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorExecutionStatus {
    /// Computation produced a result (possibly a degraded fallback)
    Success,
    /// Unrecoverable failure; the flow must abort
    Critical,
    /// Transient failure; the dispatcher will retry
    Retriable,
    /// The retry budget ran out on a transient failure
    RetriesExhausted,
}

/// One execution report flowing back to the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorResultMessage {
    pub flow_id: FlowId,
    pub processor: ProcessorId,
    pub status: ProcessorExecutionStatus,
    /// Present on `Success`; a recorded error alongside marks a fallback
    pub result: Option<ResultMap>,
    pub error: Option<FailureDetail>,
    /// 1-based attempt number that produced this report
    pub attempt: u32,
    pub execution_time_ms: u64,
    pub correlation_id: String,
}

impl ProcessorResultMessage {
    pub fn success(
        message: &DispatchMessage,
        result: ResultMap,
        error: Option<FailureDetail>,
        attempt: u32,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            flow_id: message.flow_id,
            processor: message.processor,
            status: ProcessorExecutionStatus::Success,
            result: Some(result),
            error,
            attempt,
            execution_time_ms,
            correlation_id: message.metadata.correlation_id.clone(),
        }
    }

    pub fn failure(
        message: &DispatchMessage,
        status: ProcessorExecutionStatus,
        error: FailureDetail,
        attempt: u32,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            flow_id: message.flow_id,
            processor: message.processor,
            status,
            result: None,
            error: Some(error),
            attempt,
            execution_time_ms,
            correlation_id: message.metadata.correlation_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_metadata() {
        let msg = DispatchMessage::new(
            FlowId::new(),
            ProcessorId::Grammar,
            HashMap::new(),
            RootArguments::new(),
        );
        assert_eq!(msg.metadata.max_attempts, system::DEFAULT_MAX_ATTEMPTS);
        assert_eq!(msg.metadata.queue, system::DEFAULT_QUEUE);
        assert!(!msg.metadata.correlation_id.is_empty());
    }

    #[test]
    fn test_result_message_carries_correlation() {
        let msg = DispatchMessage::new(
            FlowId::new(),
            ProcessorId::Grammar,
            HashMap::new(),
            RootArguments::new(),
        );
        let report = ProcessorResultMessage::success(&msg, ResultMap::new(), None, 1, 12);
        assert_eq!(report.correlation_id, msg.metadata.correlation_id);
        assert_eq!(report.status, ProcessorExecutionStatus::Success);
    }
}
