//! # Abort Handler
//!
//! The built-in termination processor. Dispatched in place of normal
//! dependents when any processor reports a critical failure (or exhausts its
//! retry budget), it writes the single user-visible "evaluation failed"
//! record; the orchestrator itself carries no user-facing text.

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use super::{Processor, ProcessorContext, ProcessorFailure, ProcessorId};
use crate::models::ResultMap;

pub struct AbortHandler;

#[async_trait]
impl Processor for AbortHandler {
    fn id(&self) -> ProcessorId {
        ProcessorId::AbortHandler
    }

    async fn process(&self, ctx: &ProcessorContext) -> Result<ResultMap, ProcessorFailure> {
        info!(flow_id = %ctx.flow_id, "Writing evaluation-failed record for aborted flow");

        let mut result = ResultMap::new();
        result.insert("summary".to_string(), json!("evaluation failed"));
        result.insert("flow_id".to_string(), json!(ctx.flow_id.to_string()));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FlowId, RootArguments};
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_writes_failure_summary() {
        let handler = AbortHandler;
        let ctx = ProcessorContext {
            flow_id: FlowId::new(),
            processor: ProcessorId::AbortHandler,
            inputs: HashMap::new(),
            root_arguments: RootArguments::new(),
            attempt: 1,
        };

        let result = handler.process(&ctx).await.unwrap();
        assert_eq!(result["summary"], json!("evaluation failed"));
    }
}
