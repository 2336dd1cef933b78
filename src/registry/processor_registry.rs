//! # Processor Registry
//!
//! Compile-time-keyed mapping from [`ProcessorId`] to a registered
//! [`Processor`] implementation. The dispatcher resolves implementations
//! here at execution time; registration happens once at system build time.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

use crate::error::{EventFlowError, Result};
use crate::processor::{AbortHandler, Processor, ProcessorId};

#[derive(Default)]
pub struct ProcessorRegistry {
    processors: DashMap<ProcessorId, Arc<dyn Processor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self {
            processors: DashMap::new(),
        }
    }

    /// Registry with the built-in termination processor pre-registered
    pub fn with_builtin_processors() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(AbortHandler));
        registry
    }

    /// Register a processor implementation under its own id
    pub fn register(&self, processor: Arc<dyn Processor>) {
        let id = processor.id();
        info!(processor = %id, "Registered processor");
        self.processors.insert(id, processor);
    }

    pub fn contains(&self, id: ProcessorId) -> bool {
        self.processors.contains_key(&id)
    }

    /// Resolve an implementation, failing when none is registered
    pub fn get(&self, id: ProcessorId) -> Result<Arc<dyn Processor>> {
        self.processors
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| {
                EventFlowError::DispatchError(format!("no processor registered for {id}"))
            })
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}
