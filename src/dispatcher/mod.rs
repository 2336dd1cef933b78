//! # Task Dispatcher
//!
//! Asynchronous execution seam between the orchestrator and processor
//! implementations. The orchestrator submits [`DispatchMessage`]s and reacts
//! to [`ProcessorResultMessage`]s; all retry handling lives on this side of
//! the seam, so the orchestrator only ever sees terminal outcomes plus
//! informational per-attempt retry reports.

pub mod errors;
pub mod in_process;
pub mod message;
pub mod task_dispatcher;

pub use errors::DispatchError;
pub use in_process::InProcessDispatcher;
pub use message::{
    DispatchMessage, DispatchMetadata, ProcessorExecutionStatus, ProcessorResultMessage,
};
pub use task_dispatcher::TaskDispatcher;
