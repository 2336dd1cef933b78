//! # Task Dispatcher Contract
//!
//! The orchestrator's only outbound seam: an asynchronous, at-least-once
//! task execution facility with per-task retry. The orchestrator submits one
//! message per processor execution and is driven entirely by the result
//! messages that come back; it never polls or blocks on a running processor.

use async_trait::async_trait;

use super::errors::DispatchError;
use super::message::DispatchMessage;

#[async_trait]
pub trait TaskDispatcher: Send + Sync {
    /// Enqueue asynchronous execution of one processor
    ///
    /// Guarantees at-least-once execution and at least one result message
    /// back on the results queue per terminal outcome. On permanent retry
    /// exhaustion a `RetriesExhausted` report is emitted rather than
    /// dropping the task silently.
    async fn submit(&self, message: DispatchMessage) -> Result<(), DispatchError>;
}
