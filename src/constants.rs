//! # System Constants
//!
//! Core constants and enums that define the operational boundaries of the
//! event-flow evaluation engine: lifecycle event names, status groupings,
//! and system-wide defaults.

// Re-export state types for convenience
pub use crate::state_machine::{FlowState as FlowStatus, ProcessorStatus};

/// Lifecycle events emitted through the event publisher
pub mod events {
    // Flow lifecycle events
    pub const FLOW_STARTED: &str = "flow.started";
    pub const FLOW_COMPLETED: &str = "flow.completed";
    pub const FLOW_ABORTED: &str = "flow.aborted";
    pub const FLOW_FAILED: &str = "flow.failed";

    // Processor lifecycle events
    pub const PROCESSOR_DISPATCHED: &str = "processor.dispatched";
    pub const PROCESSOR_COMPLETED: &str = "processor.completed";
    pub const PROCESSOR_COMPLETED_WITH_ERROR: &str = "processor.completed_with_error";
    pub const PROCESSOR_RETRIABLE_ERROR: &str = "processor.retriable_error";
    pub const PROCESSOR_ABORTED: &str = "processor.aborted";
    pub const PROCESSOR_RETRIES_EXHAUSTED: &str = "processor.retries_exhausted";

    // Orchestration events
    pub const TERMINATION_DISPATCHED: &str = "orchestration.termination_dispatched";
    pub const DISPATCHABLE_PROCESSORS_DISCOVERED: &str =
        "orchestration.dispatchable_processors_discovered";
}

/// Status groupings behind `ProcessorStatus::is_completion`/`is_terminal`,
/// the single source for the orchestrator's dependency and completion checks
pub mod status_groups {
    use crate::state_machine::ProcessorStatus;

    /// States that satisfy a dependent processor's `depends_on` entry and
    /// count toward flow-level completion
    pub const COMPLETION_STATES: &[ProcessorStatus] = &[
        ProcessorStatus::Completed,
        ProcessorStatus::CompletedWithError,
    ];

    /// States from which no further transition is expected
    pub const TERMINAL_STATES: &[ProcessorStatus] = &[
        ProcessorStatus::Completed,
        ProcessorStatus::CompletedWithError,
        ProcessorStatus::Error,
        ProcessorStatus::Aborted,
    ];
}

/// System-wide defaults
pub mod system {
    /// Queue used when a processor has no routing entry
    pub const DEFAULT_QUEUE: &str = "evaluation_queue";

    /// Queue for speech-derived processors (transcription, pronunciation)
    pub const SPEECH_QUEUE: &str = "speech_queue";

    /// Queue for code-evaluation processors
    pub const CODING_QUEUE: &str = "coding_queue";

    /// Default maximum execution attempts per processor dispatch
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// Default initial retry backoff in milliseconds
    pub const DEFAULT_BACKOFF_INITIAL_MS: u64 = 200;

    /// Default backoff multiplier between attempts
    pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

    /// Default ceiling for a single backoff delay in milliseconds
    pub const DEFAULT_BACKOFF_MAX_MS: u64 = 30_000;

    /// Default capacity of the lifecycle event channel
    pub const DEFAULT_EVENT_CAPACITY: usize = 1000;
}
