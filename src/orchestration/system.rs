//! # System Bootstrap
//!
//! Wires the store, registries, dispatcher, orchestrator and result loop
//! into one running system. Most deployments call
//! [`EventFlowSystem::start`] once at startup and hand flows to the
//! orchestrator from there.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use super::orchestrator::EventFlowOrchestrator;
use super::result_processor::ResultProcessor;
use crate::config::EventFlowConfig;
use crate::dispatcher::InProcessDispatcher;
use crate::error::Result;
use crate::events::EventPublisher;
use crate::registry::{DagRegistry, ProcessorRegistry};
use crate::store::InMemoryRunStateStore;

pub struct EventFlowSystem {
    orchestrator: Arc<EventFlowOrchestrator>,
    publisher: EventPublisher,
    store: Arc<InMemoryRunStateStore>,
    result_loop: JoinHandle<()>,
}

impl EventFlowSystem {
    /// Start a system with the built-in flow types and processors
    pub fn start(config: EventFlowConfig, processors: ProcessorRegistry) -> Result<Self> {
        Self::start_with_dags(config, DagRegistry::with_builtin_flows(), processors)
    }

    /// Start a system with custom DAG declarations
    pub fn start_with_dags(
        config: EventFlowConfig,
        dags: DagRegistry,
        processors: ProcessorRegistry,
    ) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(InMemoryRunStateStore::new());
        let dags = Arc::new(dags);
        let processors = Arc::new(processors);
        let publisher = EventPublisher::new(config.events.channel_capacity);

        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let dispatcher = Arc::new(InProcessDispatcher::new(
            Arc::clone(&processors),
            results_tx,
            config.dispatcher.clone(),
        ));

        let orchestrator = Arc::new(EventFlowOrchestrator::new(
            Arc::clone(&store),
            Arc::clone(&dags),
            dispatcher,
            publisher.clone(),
            &config,
        ));

        let result_loop = tokio::spawn(
            ResultProcessor::new(Arc::clone(&orchestrator), results_rx).run(),
        );

        info!(
            flow_types = dags.flow_types().count(),
            processors = processors.len(),
            "Event flow system started"
        );
        Ok(Self {
            orchestrator,
            publisher,
            store,
            result_loop,
        })
    }

    pub fn orchestrator(&self) -> &Arc<EventFlowOrchestrator> {
        &self.orchestrator
    }

    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    pub fn store(&self) -> &Arc<InMemoryRunStateStore> {
        &self.store
    }

    /// Stop the result loop; in-flight processor tasks are left to finish
    pub fn shutdown(self) {
        self.result_loop.abort();
        info!("Event flow system shut down");
    }
}
