// State machine module for event-flow orchestration
//
// Pure state/event/transition definitions for flows and processors. Transition
// application lives in the run state store, which is the only writer.

pub mod errors;
pub mod events;
pub mod states;
pub mod transitions;

// Re-export main types for convenient access
pub use errors::StateMachineError;
pub use events::ProcessorEvent;
pub use states::{FlowState, ProcessorStatus};
pub use transitions::determine_target_status;
