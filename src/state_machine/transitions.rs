//! # Processor Transition Table
//!
//! Pure `(status, event) -> status` resolution for processor state changes.
//! The run state store consults this table before every write, so an illegal
//! transition (for example a duplicate completion callback) is refused at the
//! single choke point instead of being scattered across orchestration code.

use super::errors::{StateMachineError, StateMachineResult};
use super::events::ProcessorEvent;
use super::states::ProcessorStatus;

/// Determine the target status for a processor event
pub fn determine_target_status(
    current: ProcessorStatus,
    event: &ProcessorEvent,
) -> StateMachineResult<ProcessorStatus> {
    use ProcessorStatus::*;

    let target = match (current, event) {
        // Dispatch claims a pending processor
        (Pending, ProcessorEvent::Dispatch) => InProgress,

        // Completion, from an active attempt (first or retried)
        (InProgress | RetriableError, ProcessorEvent::Complete { error: None, .. }) => Completed,
        (InProgress | RetriableError, ProcessorEvent::Complete { error: Some(_), .. }) => {
            CompletedWithError
        }

        // Transient failure; overwritten on each retry attempt
        (InProgress | RetriableError, ProcessorEvent::RetriableFail(_)) => RetriableError,

        // Critical failure, or forced abort of a never-dispatched processor
        (Pending | InProgress | RetriableError, ProcessorEvent::Abort(_)) => Aborted,

        // Retry budget exhausted
        (InProgress | RetriableError, ProcessorEvent::ExhaustRetries(_)) => Error,

        (from, event) => {
            return Err(StateMachineError::InvalidTransition {
                from: from.to_string(),
                event: event.event_type().to_string(),
            })
        }
    };

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FailureDetail;

    fn detail() -> FailureDetail {
        FailureDetail::new("boom", Some("trace".to_string()))
    }

    #[test]
    fn test_dispatch_claims_pending_only() {
        assert_eq!(
            determine_target_status(ProcessorStatus::Pending, &ProcessorEvent::Dispatch).unwrap(),
            ProcessorStatus::InProgress
        );
        assert!(
            determine_target_status(ProcessorStatus::InProgress, &ProcessorEvent::Dispatch)
                .is_err()
        );
        assert!(
            determine_target_status(ProcessorStatus::Completed, &ProcessorEvent::Dispatch)
                .is_err()
        );
    }

    #[test]
    fn test_completion_paths() {
        let success = ProcessorEvent::Complete {
            result: Default::default(),
            error: None,
        };
        let degraded = ProcessorEvent::Complete {
            result: Default::default(),
            error: Some(detail()),
        };

        assert_eq!(
            determine_target_status(ProcessorStatus::InProgress, &success).unwrap(),
            ProcessorStatus::Completed
        );
        assert_eq!(
            determine_target_status(ProcessorStatus::RetriableError, &success).unwrap(),
            ProcessorStatus::Completed
        );
        assert_eq!(
            determine_target_status(ProcessorStatus::InProgress, &degraded).unwrap(),
            ProcessorStatus::CompletedWithError
        );
    }

    #[test]
    fn test_duplicate_completion_refused() {
        let success = ProcessorEvent::Complete {
            result: Default::default(),
            error: None,
        };
        assert!(determine_target_status(ProcessorStatus::Completed, &success).is_err());
        assert!(determine_target_status(ProcessorStatus::Aborted, &success).is_err());
    }

    #[test]
    fn test_retriable_failure_loops() {
        let event = ProcessorEvent::RetriableFail(detail());
        assert_eq!(
            determine_target_status(ProcessorStatus::InProgress, &event).unwrap(),
            ProcessorStatus::RetriableError
        );
        // A second transient failure overwrites the first
        assert_eq!(
            determine_target_status(ProcessorStatus::RetriableError, &event).unwrap(),
            ProcessorStatus::RetriableError
        );
    }

    #[test]
    fn test_abort_from_pending_and_active() {
        let event = ProcessorEvent::Abort(Some(detail()));
        assert_eq!(
            determine_target_status(ProcessorStatus::Pending, &event).unwrap(),
            ProcessorStatus::Aborted
        );
        assert_eq!(
            determine_target_status(ProcessorStatus::InProgress, &event).unwrap(),
            ProcessorStatus::Aborted
        );
        assert!(determine_target_status(ProcessorStatus::Completed, &event).is_err());
    }

    #[test]
    fn test_retry_exhaustion() {
        let event = ProcessorEvent::ExhaustRetries(detail());
        assert_eq!(
            determine_target_status(ProcessorStatus::RetriableError, &event).unwrap(),
            ProcessorStatus::Error
        );
        assert!(determine_target_status(ProcessorStatus::Pending, &event).is_err());
    }
}
