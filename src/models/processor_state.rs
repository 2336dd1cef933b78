use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ResultMap;
use crate::processor::ProcessorId;
use crate::state_machine::{
    determine_target_status, ProcessorEvent, ProcessorStatus, StateMachineError,
};

/// Captured failure detail: message plus an optional stack trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub message: String,
    pub stacktrace: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl FailureDetail {
    pub fn new(message: impl Into<String>, stacktrace: Option<String>) -> Self {
        Self {
            message: message.into(),
            stacktrace,
            occurred_at: Utc::now(),
        }
    }
}

/// Per-(flow, processor) state record
///
/// `retriable_error` holds only the most recent transient failure and is
/// overwritten on each retry attempt; it never accumulates history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorStateRecord {
    pub processor: ProcessorId,
    pub status: ProcessorStatus,
    pub result: Option<ResultMap>,
    pub error: Option<FailureDetail>,
    pub retriable_error: Option<FailureDetail>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub run_duration_ms: Option<i64>,
}

impl ProcessorStateRecord {
    pub fn new(processor: ProcessorId) -> Self {
        Self {
            processor,
            status: ProcessorStatus::Pending,
            result: None,
            error: None,
            retriable_error: None,
            start_time: None,
            end_time: None,
            run_duration_ms: None,
        }
    }

    /// Apply a transition event, refusing illegal transitions
    ///
    /// This is the single mutation path for processor rows; the store calls
    /// it under the flow lock so a write and the flow-completion recheck are
    /// one atomic step.
    pub fn apply(
        &mut self,
        event: ProcessorEvent,
        at: DateTime<Utc>,
    ) -> Result<ProcessorStatus, StateMachineError> {
        let target = determine_target_status(self.status, &event)?;

        match event {
            ProcessorEvent::Dispatch => {
                self.start_time = Some(at);
            }
            ProcessorEvent::Complete { result, error } => {
                self.result = Some(result);
                self.error = error;
                self.stamp_end(at);
            }
            ProcessorEvent::RetriableFail(detail) => {
                self.retriable_error = Some(detail);
            }
            ProcessorEvent::Abort(detail) => {
                if detail.is_some() {
                    self.error = detail;
                }
                self.stamp_end(at);
            }
            ProcessorEvent::ExhaustRetries(detail) => {
                self.error = Some(detail);
                self.stamp_end(at);
            }
        }

        self.status = target;
        Ok(target)
    }

    fn stamp_end(&mut self, at: DateTime<Utc>) {
        self.end_time = Some(at);
        if let Some(start) = self.start_time {
            self.run_duration_ms = Some((at - start).num_milliseconds());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> ProcessorStateRecord {
        ProcessorStateRecord::new(ProcessorId::Grammar)
    }

    #[test]
    fn test_lifecycle_pending_to_completed() {
        let mut rec = record();
        let t0 = Utc::now();
        rec.apply(ProcessorEvent::Dispatch, t0).unwrap();
        assert_eq!(rec.status, ProcessorStatus::InProgress);
        assert_eq!(rec.start_time, Some(t0));

        let t1 = t0 + chrono::Duration::milliseconds(250);
        let mut result = ResultMap::new();
        result.insert("score".to_string(), json!(0.8));
        rec.apply(
            ProcessorEvent::Complete {
                result: result.clone(),
                error: None,
            },
            t1,
        )
        .unwrap();

        assert_eq!(rec.status, ProcessorStatus::Completed);
        assert_eq!(rec.result, Some(result));
        assert_eq!(rec.run_duration_ms, Some(250));
        assert!(rec.error.is_none());
    }

    #[test]
    fn test_retriable_error_is_overwritten_not_appended() {
        let mut rec = record();
        rec.apply(ProcessorEvent::Dispatch, Utc::now()).unwrap();

        let first = FailureDetail::new("rate limited", Some("trace-1".to_string()));
        rec.apply(ProcessorEvent::RetriableFail(first), Utc::now())
            .unwrap();
        let second = FailureDetail::new("rate limited again", Some("trace-2".to_string()));
        rec.apply(ProcessorEvent::RetriableFail(second.clone()), Utc::now())
            .unwrap();

        assert_eq!(rec.status, ProcessorStatus::RetriableError);
        assert_eq!(rec.retriable_error, Some(second));
    }

    #[test]
    fn test_completion_after_retries_keeps_last_retriable_error() {
        let mut rec = record();
        rec.apply(ProcessorEvent::Dispatch, Utc::now()).unwrap();
        let detail = FailureDetail::new("flaky upstream", None);
        rec.apply(ProcessorEvent::RetriableFail(detail.clone()), Utc::now())
            .unwrap();
        rec.apply(
            ProcessorEvent::Complete {
                result: ResultMap::new(),
                error: None,
            },
            Utc::now(),
        )
        .unwrap();

        assert_eq!(rec.status, ProcessorStatus::Completed);
        assert_eq!(rec.retriable_error, Some(detail));
    }

    #[test]
    fn test_degraded_completion_records_error() {
        let mut rec = record();
        rec.apply(ProcessorEvent::Dispatch, Utc::now()).unwrap();
        let detail = FailureDetail::new("scoring fell back to zero", None);
        rec.apply(
            ProcessorEvent::Complete {
                result: ResultMap::new(),
                error: Some(detail.clone()),
            },
            Utc::now(),
        )
        .unwrap();

        assert_eq!(rec.status, ProcessorStatus::CompletedWithError);
        assert_eq!(rec.error, Some(detail));
    }

    #[test]
    fn test_duplicate_completion_is_refused() {
        let mut rec = record();
        rec.apply(ProcessorEvent::Dispatch, Utc::now()).unwrap();
        rec.apply(
            ProcessorEvent::Complete {
                result: ResultMap::new(),
                error: None,
            },
            Utc::now(),
        )
        .unwrap();

        let err = rec
            .apply(
                ProcessorEvent::Complete {
                    result: ResultMap::new(),
                    error: None,
                },
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, StateMachineError::InvalidTransition { .. }));
    }

    #[test]
    fn test_forced_abort_from_pending_has_no_duration() {
        let mut rec = record();
        rec.apply(ProcessorEvent::Abort(None), Utc::now()).unwrap();
        assert_eq!(rec.status, ProcessorStatus::Aborted);
        assert!(rec.run_duration_ms.is_none());
    }
}
