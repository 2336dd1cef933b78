//! # EventFlow Core
//!
//! Reactive DAG orchestration engine for multi-stage evaluation pipelines.
//!
//! ## Overview
//!
//! An evaluation run ("flow") executes a statically declared DAG of
//! processors: transcription feeds grammar and sentiment scoring, scorers
//! feed the final report, and so on per flow type. The orchestrator is
//! purely callback-driven; it reacts to processor results, unlocks
//! dependents the moment their last dependency completes, and routes
//! critical failures through a termination processor so every run ends in
//! exactly one terminal state.
//!
//! ## Key Components
//!
//! - **DAG registry** ([`registry`]): validated per-flow-type dependency
//!   declarations plus processor-to-queue routing
//! - **Processor contract** ([`processor`]): the pluggable scoring unit with
//!   classified failures and optional degraded fallbacks
//! - **Run state store** ([`store`]): per-flow locked state, the single
//!   source of truth for orchestration decisions
//! - **Orchestration** ([`orchestration`]): discovery, finalization, the
//!   orchestrator callbacks and the system bootstrap
//! - **Dispatcher** ([`dispatcher`]): asynchronous execution with retry and
//!   exponential backoff
//! - **Events** ([`events`]): broadcast lifecycle events for observers
//!
//! ## Example
//!
//! ```no_run
//! use eventflow_core::config::EventFlowConfig;
//! use eventflow_core::orchestration::EventFlowSystem;
//! use eventflow_core::registry::ProcessorRegistry;
//!
//! # async fn run() -> eventflow_core::Result<()> {
//! let processors = ProcessorRegistry::with_builtin_processors();
//! // register scoring processors here
//! let system = EventFlowSystem::start(EventFlowConfig::default(), processors)?;
//!
//! let flow_id = system
//!     .orchestrator()
//!     .start_new_eventflow("speaking", Default::default(), "user-42")
//!     .await?;
//! # let _ = flow_id;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod processor;
pub mod registry;
pub mod state_machine;
pub mod store;

pub use config::EventFlowConfig;
pub use error::{EventFlowError, Result};
pub use logging::init_structured_logging;
pub use models::{FailureDetail, Flow, FlowId, ResultMap, RootArguments};
pub use orchestration::{EventFlowOrchestrator, EventFlowSystem};
pub use processor::{Processor, ProcessorContext, ProcessorFailure, ProcessorId};
pub use registry::{DagRegistry, FlowDag, ProcessorRegistry};
pub use state_machine::{FlowState, ProcessorStatus};
pub use store::FlowSnapshot;
