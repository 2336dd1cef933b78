//! # Dispatch Error Types

use thiserror::Error;

use crate::processor::ProcessorId;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("No processor registered for {processor}")]
    ProcessorNotRegistered { processor: ProcessorId },

    #[error("Results queue closed while submitting {processor}")]
    ResultsQueueClosed { processor: ProcessorId },
}
