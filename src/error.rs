use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum EventFlowError {
    UnknownFlowType(String),
    InvalidDag(String),
    StateTransitionError(String),
    OrchestrationError(String),
    DispatchError(String),
    EventError(String),
    ConfigurationError(String),
    StoreError(String),
}

impl fmt::Display for EventFlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventFlowError::UnknownFlowType(name) => write!(f, "Unknown flow type: {name}"),
            EventFlowError::InvalidDag(msg) => write!(f, "Invalid DAG: {msg}"),
            EventFlowError::StateTransitionError(msg) => {
                write!(f, "State transition error: {msg}")
            }
            EventFlowError::OrchestrationError(msg) => write!(f, "Orchestration error: {msg}"),
            EventFlowError::DispatchError(msg) => write!(f, "Dispatch error: {msg}"),
            EventFlowError::EventError(msg) => write!(f, "Event error: {msg}"),
            EventFlowError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
            EventFlowError::StoreError(msg) => write!(f, "State store error: {msg}"),
        }
    }
}

impl std::error::Error for EventFlowError {}

impl From<crate::state_machine::StateMachineError> for EventFlowError {
    fn from(err: crate::state_machine::StateMachineError) -> Self {
        EventFlowError::StateTransitionError(err.to_string())
    }
}

impl From<crate::dispatcher::DispatchError> for EventFlowError {
    fn from(err: crate::dispatcher::DispatchError) -> Self {
        EventFlowError::DispatchError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EventFlowError>;
