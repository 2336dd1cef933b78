//! # Processor Contract
//!
//! The pluggable leaf of the engine: a [`Processor`] consumes the results of
//! its declared upstream dependencies plus the flow-wide root arguments and
//! either returns a result mapping or fails with a classified
//! [`ProcessorFailure`]. The [`execute`] wrapper converts every run into
//! exactly one [`ProcessorOutcome`], so the dispatcher and the orchestrator
//! pattern-match on a tagged value instead of catching distinguishable
//! exception types.
//!
//! Failure classification follows an optimistic-retry bias: a failure is
//! retried unless the processor explicitly marks it critical. A processor may
//! also opt into a degraded fallback result for non-critical failures, which
//! completes the flow instead of blocking it.

pub mod abort_handler;
pub mod id;

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use tracing::{error, warn};

use crate::models::{FailureDetail, FlowId, ResultMap, RootArguments};

pub use abort_handler::AbortHandler;
pub use id::ProcessorId;

/// Inputs handed to a processor for a single execution attempt
#[derive(Debug, Clone)]
pub struct ProcessorContext {
    pub flow_id: FlowId,
    pub processor: ProcessorId,
    /// Full result mapping of each upstream processor in this processor's
    /// `depends_on` set, and nothing else
    pub inputs: HashMap<ProcessorId, ResultMap>,
    pub root_arguments: RootArguments,
    /// 1-based attempt number for this dispatch
    pub attempt: u32,
}

/// Failure classification for processor errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Unrecoverable; routes the flow to the termination processor
    Critical,
    /// Transient; the dispatcher re-invokes the same processor with backoff
    Retriable,
}

/// A classified processor failure
#[derive(Debug, Clone)]
pub struct ProcessorFailure {
    pub kind: FailureKind,
    pub message: String,
    pub stacktrace: Option<String>,
}

impl ProcessorFailure {
    pub fn critical(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Critical,
            message: message.into(),
            stacktrace: None,
        }
    }

    pub fn retriable(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Retriable,
            message: message.into(),
            stacktrace: None,
        }
    }

    pub fn with_stacktrace(mut self, stacktrace: impl Into<String>) -> Self {
        self.stacktrace = Some(stacktrace.into());
        self
    }

    pub fn detail(&self) -> FailureDetail {
        FailureDetail::new(self.message.clone(), self.stacktrace.clone())
    }
}

impl fmt::Display for ProcessorFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FailureKind::Critical => write!(f, "critical failure: {}", self.message),
            FailureKind::Retriable => write!(f, "retriable failure: {}", self.message),
        }
    }
}

/// Unclassified errors default to the retriable path
impl From<anyhow::Error> for ProcessorFailure {
    fn from(err: anyhow::Error) -> Self {
        Self {
            kind: FailureKind::Retriable,
            message: err.to_string(),
            stacktrace: Some(format!("{err:?}")),
        }
    }
}

/// Tagged outcome of one processor execution attempt
#[derive(Debug, Clone)]
pub enum ProcessorOutcome {
    /// Computation succeeded
    Success(ResultMap),
    /// A non-critical failure was substituted with a fallback result
    Degraded {
        result: ResultMap,
        error: FailureDetail,
    },
    /// Unrecoverable failure; the flow must short-circuit to termination
    CriticalFailure(FailureDetail),
    /// Transient failure; the dispatcher should retry this processor
    RetriableFailure(FailureDetail),
}

/// A unit of scoring work with declared upstream dependencies
#[async_trait]
pub trait Processor: Send + Sync {
    /// Identifier this implementation is registered under
    fn id(&self) -> ProcessorId;

    /// Perform the computation
    async fn process(&self, ctx: &ProcessorContext) -> Result<ResultMap, ProcessorFailure>;

    /// Optional degraded result to substitute for a non-critical failure
    ///
    /// Returning `Some` completes the processor as `COMPLETED_WITH_ERROR`
    /// instead of triggering a retry. Opt-in per processor; the default never
    /// falls back.
    fn fallback_result(&self, _failure: &ProcessorFailure) -> Option<ResultMap> {
        None
    }
}

/// Run one execution attempt and fold every path into a single outcome
pub async fn execute(processor: &dyn Processor, ctx: &ProcessorContext) -> ProcessorOutcome {
    match processor.process(ctx).await {
        Ok(result) => ProcessorOutcome::Success(result),
        Err(failure) => match failure.kind {
            FailureKind::Critical => {
                error!(
                    flow_id = %ctx.flow_id,
                    processor = %ctx.processor,
                    error = %failure.message,
                    "Processor reported critical failure"
                );
                ProcessorOutcome::CriticalFailure(failure.detail())
            }
            FailureKind::Retriable => {
                if let Some(fallback) = processor.fallback_result(&failure) {
                    warn!(
                        flow_id = %ctx.flow_id,
                        processor = %ctx.processor,
                        error = %failure.message,
                        "Processor failed, substituting fallback result"
                    );
                    ProcessorOutcome::Degraded {
                        result: fallback,
                        error: failure.detail(),
                    }
                } else {
                    warn!(
                        flow_id = %ctx.flow_id,
                        processor = %ctx.processor,
                        attempt = ctx.attempt,
                        error = %failure.message,
                        "Processor reported retriable failure"
                    );
                    ProcessorOutcome::RetriableFailure(failure.detail())
                }
            }
        },
    }
}
