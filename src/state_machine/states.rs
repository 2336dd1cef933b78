use serde::{Deserialize, Serialize};
use std::fmt;

/// Flow-level state for one end-to-end evaluation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    /// Initial state when the flow is created
    Started,
    /// Every declared processor reached a completion state
    Completed,
    /// A processor exhausted its retry budget
    Error,
    /// A critical failure short-circuited the flow to the termination processor
    Aborted,
}

impl FlowState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Aborted)
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => write!(f, "started"),
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

impl std::str::FromStr for FlowState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "started" => Ok(Self::Started),
            "completed" => Ok(Self::Completed),
            "error" => Ok(Self::Error),
            "aborted" => Ok(Self::Aborted),
            _ => Err(format!("Invalid flow state: {s}")),
        }
    }
}

/// Per-processor state within a flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorStatus {
    /// Initial state when the processor row is created
    Pending,
    /// Dispatched to the task dispatcher, awaiting a callback
    InProgress,
    /// Finished successfully with a result
    Completed,
    /// Finished with a degraded fallback result and a recorded error
    CompletedWithError,
    /// Failed permanently (retry budget exhausted)
    Error,
    /// Short-circuited by a critical failure (own or forced by the abort path)
    Aborted,
    /// Most recent attempt failed transiently; the dispatcher will retry
    RetriableError,
}

impl ProcessorStatus {
    /// Check if this status counts toward flow-level completion and satisfies
    /// dependent processors' `depends_on` entries
    pub fn is_completion(&self) -> bool {
        crate::constants::status_groups::COMPLETION_STATES.contains(self)
    }

    /// Check if no further transition is expected from this status
    pub fn is_terminal(&self) -> bool {
        crate::constants::status_groups::TERMINAL_STATES.contains(self)
    }

    /// Check if the processor is currently held by the dispatcher
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress | Self::RetriableError)
    }
}

impl fmt::Display for ProcessorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::CompletedWithError => write!(f, "completed_with_error"),
            Self::Error => write!(f, "error"),
            Self::Aborted => write!(f, "aborted"),
            Self::RetriableError => write!(f, "retriable_error"),
        }
    }
}

impl std::str::FromStr for ProcessorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "completed_with_error" => Ok(Self::CompletedWithError),
            "error" => Ok(Self::Error),
            "aborted" => Ok(Self::Aborted),
            "retriable_error" => Ok(Self::RetriableError),
            _ => Err(format!("Invalid processor status: {s}")),
        }
    }
}

/// Default state for new flows
impl Default for FlowState {
    fn default() -> Self {
        Self::Started
    }
}

/// Default status for new processor rows
impl Default for ProcessorStatus {
    fn default() -> Self {
        Self::Pending
    }
}
