//! # DAG Registry
//!
//! Static, per-flow-type declaration of processor dependencies plus the
//! designated termination processor. Declared at deployment time and
//! validated at registration; `get_dag` is a pure lookup with no mutation.
//!
//! The registry also carries an optional processor-to-queue routing table
//! used only to pick which execution queue the task dispatcher uses. Routing
//! is a deployment concern, not a correctness concern.

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::DiGraph;
use std::collections::HashMap;

use crate::constants::system;
use crate::error::{EventFlowError, Result};
use crate::processor::ProcessorId;

/// Dependency declaration for one flow type
#[derive(Debug, Clone)]
pub struct FlowDag {
    /// Processor name -> set of upstream processors it depends on
    processors: HashMap<ProcessorId, Vec<ProcessorId>>,
    /// Processor dispatched in place of normal dependents on critical failure
    termination_processor: ProcessorId,
}

impl FlowDag {
    /// Build and validate a DAG definition
    ///
    /// Fails when a dependency references an undeclared processor, when the
    /// graph is cyclic, when no root processor exists, or when the
    /// termination processor is itself part of the graph.
    pub fn new(
        processors: HashMap<ProcessorId, Vec<ProcessorId>>,
        termination_processor: ProcessorId,
    ) -> Result<Self> {
        if processors.is_empty() {
            return Err(EventFlowError::InvalidDag(
                "flow declares no processors".to_string(),
            ));
        }
        if processors.contains_key(&termination_processor) {
            return Err(EventFlowError::InvalidDag(format!(
                "termination processor {termination_processor} cannot appear in the graph"
            )));
        }

        for (processor, deps) in &processors {
            for dep in deps {
                if !processors.contains_key(dep) {
                    return Err(EventFlowError::InvalidDag(format!(
                        "{processor} depends on undeclared processor {dep}"
                    )));
                }
            }
        }

        let mut graph = DiGraph::<ProcessorId, ()>::new();
        let mut indices = HashMap::new();
        for id in processors.keys() {
            indices.insert(*id, graph.add_node(*id));
        }
        for (processor, deps) in &processors {
            for dep in deps {
                graph.add_edge(indices[dep], indices[processor], ());
            }
        }
        if is_cyclic_directed(&graph) {
            return Err(EventFlowError::InvalidDag(
                "dependency graph contains a cycle".to_string(),
            ));
        }

        let dag = Self {
            processors,
            termination_processor,
        };
        if dag.root_processors().is_empty() {
            return Err(EventFlowError::InvalidDag(
                "flow has no root processors".to_string(),
            ));
        }
        Ok(dag)
    }

    /// Processors declared for this flow type
    pub fn processors(&self) -> impl Iterator<Item = ProcessorId> + '_ {
        self.processors.keys().copied()
    }

    pub fn contains(&self, processor: ProcessorId) -> bool {
        self.processors.contains_key(&processor)
    }

    /// Upstream dependencies of one processor
    pub fn depends_on(&self, processor: ProcessorId) -> &[ProcessorId] {
        self.processors
            .get(&processor)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Processors with an empty dependency set, dispatchable at flow start
    pub fn root_processors(&self) -> Vec<ProcessorId> {
        let mut roots: Vec<ProcessorId> = self
            .processors
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(id, _)| *id)
            .collect();
        roots.sort();
        roots
    }

    pub fn termination_processor(&self) -> ProcessorId {
        self.termination_processor
    }
}

/// Per-flow-type DAG lookup, static after construction
pub struct DagRegistry {
    dags: HashMap<String, FlowDag>,
    routing: HashMap<ProcessorId, String>,
}

impl DagRegistry {
    /// Empty registry for custom deployments
    pub fn new() -> Self {
        Self {
            dags: HashMap::new(),
            routing: HashMap::new(),
        }
    }

    /// Registry preloaded with the built-in evaluation flow types
    pub fn with_builtin_flows() -> Self {
        let mut registry = Self::new();
        for (flow_type, dag) in builtin_flows() {
            registry.register(flow_type, dag);
        }
        registry.routing = builtin_routing();
        registry
    }

    /// Register a flow type; later registrations replace earlier ones
    pub fn register(&mut self, flow_type: impl Into<String>, dag: FlowDag) {
        self.dags.insert(flow_type.into(), dag);
    }

    /// Set the execution queue for a processor
    pub fn route(&mut self, processor: ProcessorId, queue: impl Into<String>) {
        self.routing.insert(processor, queue.into());
    }

    /// Pure lookup; fails with `UnknownFlowType` for unregistered types
    pub fn get_dag(&self, flow_type: &str) -> Result<&FlowDag> {
        self.dags
            .get(flow_type)
            .ok_or_else(|| EventFlowError::UnknownFlowType(flow_type.to_string()))
    }

    /// Execution queue for a processor, defaulting to the generic queue
    pub fn queue_for(&self, processor: ProcessorId) -> &str {
        self.routing
            .get(&processor)
            .map(String::as_str)
            .unwrap_or(system::DEFAULT_QUEUE)
    }

    pub fn flow_types(&self) -> impl Iterator<Item = &str> {
        self.dags.keys().map(String::as_str)
    }
}

impl Default for DagRegistry {
    fn default() -> Self {
        Self::with_builtin_flows()
    }
}

fn dag(edges: &[(ProcessorId, &[ProcessorId])]) -> FlowDag {
    let processors = edges
        .iter()
        .map(|(id, deps)| (*id, deps.to_vec()))
        .collect();
    // Built-in definitions are static; a panic here is a programming error
    // caught by the registry tests.
    FlowDag::new(processors, ProcessorId::AbortHandler).expect("builtin DAG must be valid")
}

fn builtin_flows() -> Vec<(&'static str, FlowDag)> {
    use ProcessorId::*;

    vec![
        (
            "default",
            dag(&[
                (Transcription, &[]),
                (Grammar, &[Transcription]),
                (Sentiment, &[Transcription]),
                (EvaluationReport, &[Grammar, Sentiment]),
            ]),
        ),
        (
            "speaking",
            dag(&[
                (Transcription, &[]),
                (Pronunciation, &[]),
                (Fluency, &[Transcription]),
                (Grammar, &[Transcription]),
                (Vocabulary, &[Transcription]),
                (EvaluationReport, &[Pronunciation, Fluency, Grammar, Vocabulary]),
            ]),
        ),
        (
            "writing",
            dag(&[
                (Grammar, &[]),
                (Vocabulary, &[]),
                (Coherence, &[]),
                (EvaluationReport, &[Grammar, Vocabulary, Coherence]),
            ]),
        ),
        (
            "coding",
            dag(&[
                (CodeCompilation, &[]),
                (CodeEfficiency, &[CodeCompilation]),
                (CodeQuality, &[CodeCompilation]),
                (EvaluationReport, &[CodeEfficiency, CodeQuality]),
            ]),
        ),
        (
            "mock_behavioural",
            dag(&[
                (Transcription, &[]),
                (Sentiment, &[Transcription]),
                (KeywordCoverage, &[Transcription]),
                (EvaluationReport, &[Sentiment, KeywordCoverage]),
            ]),
        ),
    ]
}

fn builtin_routing() -> HashMap<ProcessorId, String> {
    use ProcessorId::*;

    let mut routing = HashMap::new();
    routing.insert(Transcription, system::SPEECH_QUEUE.to_string());
    routing.insert(Pronunciation, system::SPEECH_QUEUE.to_string());
    routing.insert(CodeCompilation, system::CODING_QUEUE.to_string());
    routing.insert(CodeEfficiency, system::CODING_QUEUE.to_string());
    routing.insert(CodeQuality, system::CODING_QUEUE.to_string());
    routing
}

#[cfg(test)]
mod tests {
    use super::*;
    use ProcessorId::*;

    #[test]
    fn test_builtin_flows_are_valid() {
        let registry = DagRegistry::with_builtin_flows();
        for flow_type in ["default", "speaking", "writing", "coding", "mock_behavioural"] {
            let dag = registry.get_dag(flow_type).unwrap();
            assert!(!dag.root_processors().is_empty(), "{flow_type} has roots");
            assert_eq!(dag.termination_processor(), AbortHandler);
        }
    }

    #[test]
    fn test_unknown_flow_type() {
        let registry = DagRegistry::with_builtin_flows();
        assert_eq!(
            registry.get_dag("listening").unwrap_err(),
            EventFlowError::UnknownFlowType("listening".to_string())
        );
    }

    #[test]
    fn test_cyclic_dag_rejected() {
        let mut processors = HashMap::new();
        processors.insert(Grammar, vec![Sentiment]);
        processors.insert(Sentiment, vec![Grammar]);

        let err = FlowDag::new(processors, AbortHandler).unwrap_err();
        assert!(matches!(err, EventFlowError::InvalidDag(_)));
    }

    #[test]
    fn test_undeclared_dependency_rejected() {
        let mut processors = HashMap::new();
        processors.insert(Grammar, vec![Transcription]);

        let err = FlowDag::new(processors, AbortHandler).unwrap_err();
        assert!(matches!(err, EventFlowError::InvalidDag(_)));
    }

    #[test]
    fn test_termination_processor_outside_graph() {
        let mut processors = HashMap::new();
        processors.insert(AbortHandler, vec![]);

        let err = FlowDag::new(processors, AbortHandler).unwrap_err();
        assert!(matches!(err, EventFlowError::InvalidDag(_)));
    }

    #[test]
    fn test_root_discovery() {
        let registry = DagRegistry::with_builtin_flows();
        let dag = registry.get_dag("speaking").unwrap();
        assert_eq!(dag.root_processors(), vec![Transcription, Pronunciation]);
        assert_eq!(
            dag.depends_on(Fluency),
            &[Transcription]
        );
    }

    #[test]
    fn test_queue_routing_with_default() {
        let registry = DagRegistry::with_builtin_flows();
        assert_eq!(registry.queue_for(Transcription), system::SPEECH_QUEUE);
        assert_eq!(registry.queue_for(Grammar), system::DEFAULT_QUEUE);
    }
}
