//! # Flow Orchestration
//!
//! The coordination core: reactive, callback-driven advancement of
//! evaluation flows over their declared DAGs.
//!
//! ## Components
//!
//! - **Discovery** ([`discovery`]): incremental readiness scan that claims
//!   dispatchable processors under the flow lock
//! - **Finalizer** ([`finalizer`]): derives and stamps the flow-level
//!   terminal status exactly once
//! - **Orchestrator** ([`orchestrator`]): the callback surface that ties
//!   completion writes, discovery, failure routing and finalization together
//! - **Result processor** ([`result_processor`]): consumes the dispatcher's
//!   results queue and routes each report to an orchestrator callback
//! - **System** ([`system`]): one-call bootstrap of the whole stack

pub mod discovery;
pub mod finalizer;
pub mod orchestrator;
pub mod result_processor;
pub mod system;

pub use discovery::{claim_dispatchable, DispatchableProcessor};
pub use finalizer::{finalize_if_complete, terminal_flow_state};
pub use orchestrator::EventFlowOrchestrator;
pub use result_processor::ResultProcessor;
pub use system::EventFlowSystem;
