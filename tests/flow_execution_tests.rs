//! End-to-end flow execution tests
//!
//! Exercise the whole stack: system bootstrap, root dispatch, dependency
//! unlocking, retry with backoff, degraded fallbacks and the termination
//! path, with real tokio tasks behind the in-process dispatcher.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use eventflow_core::config::EventFlowConfig;
use eventflow_core::orchestration::EventFlowSystem;
use eventflow_core::processor::{
    Processor, ProcessorContext, ProcessorFailure, ProcessorId,
};
use eventflow_core::registry::ProcessorRegistry;
use eventflow_core::state_machine::{FlowState, ProcessorStatus};
use eventflow_core::store::FlowSnapshot;
use eventflow_core::{FlowId, ResultMap};

type Script = Box<dyn Fn(u32) -> Result<ResultMap, ProcessorFailure> + Send + Sync>;

/// Test processor driven by a per-attempt script
struct ScriptedProcessor {
    id: ProcessorId,
    script: Script,
    fallback: Option<ResultMap>,
    calls: Arc<AtomicU32>,
    seen_inputs: Arc<Mutex<Vec<HashMap<ProcessorId, ResultMap>>>>,
}

impl ScriptedProcessor {
    fn new(id: ProcessorId, script: Script) -> Self {
        Self {
            id,
            script,
            fallback: None,
            calls: Arc::new(AtomicU32::new(0)),
            seen_inputs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn succeeding(id: ProcessorId, result: ResultMap) -> Self {
        Self::new(id, Box::new(move |_| Ok(result.clone())))
    }

    fn with_fallback(mut self, fallback: ResultMap) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

#[async_trait]
impl Processor for ScriptedProcessor {
    fn id(&self) -> ProcessorId {
        self.id
    }

    async fn process(&self, ctx: &ProcessorContext) -> Result<ResultMap, ProcessorFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_inputs.lock().push(ctx.inputs.clone());
        (self.script)(ctx.attempt)
    }

    fn fallback_result(&self, _failure: &ProcessorFailure) -> Option<ResultMap> {
        self.fallback.clone()
    }
}

fn result(key: &str, value: serde_json::Value) -> ResultMap {
    let mut map = ResultMap::new();
    map.insert(key.to_string(), value);
    map
}

fn fast_config() -> EventFlowConfig {
    let mut config = EventFlowConfig::default();
    config.dispatcher.backoff.initial_delay_ms = 1;
    config.dispatcher.backoff.max_delay_ms = 5;
    config
}

async fn wait_for_terminal(system: &EventFlowSystem, flow_id: FlowId) -> FlowSnapshot {
    for _ in 0..250 {
        let snapshot = system.store().snapshot(flow_id).unwrap();
        if snapshot.flow.is_terminal() {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("flow {flow_id} did not reach a terminal state");
}

#[tokio::test]
async fn test_default_flow_completes_end_to_end() {
    let registry = ProcessorRegistry::with_builtin_processors();
    let report = Arc::new(ScriptedProcessor::succeeding(
        ProcessorId::EvaluationReport,
        result("grade", json!("B+")),
    ));
    registry.register(Arc::new(ScriptedProcessor::succeeding(
        ProcessorId::Transcription,
        result("text", json!("hello world")),
    )));
    registry.register(Arc::new(ScriptedProcessor::succeeding(
        ProcessorId::Grammar,
        result("grammar_score", json!(0.9)),
    )));
    registry.register(Arc::new(ScriptedProcessor::succeeding(
        ProcessorId::Sentiment,
        result("sentiment", json!("positive")),
    )));
    registry.register(Arc::clone(&report) as Arc<dyn Processor>);

    let system = EventFlowSystem::start(fast_config(), registry).unwrap();
    let flow_id = system
        .orchestrator()
        .start_new_eventflow("default", result("submission_id", json!(7)), "user-1")
        .await
        .unwrap();

    let snapshot = wait_for_terminal(&system, flow_id).await;

    assert_eq!(snapshot.flow.status, FlowState::Completed);
    for record in snapshot.processors.values() {
        assert_eq!(record.status, ProcessorStatus::Completed);
        assert!(record.result.is_some());
        assert!(record.run_duration_ms.is_some());
    }

    // run duration is the exact difference of the stamped timestamps
    let end = snapshot.flow.end_time.unwrap();
    assert_eq!(
        snapshot.flow.run_duration_ms.unwrap(),
        (end - snapshot.flow.start_time).num_milliseconds()
    );

    // the report saw exactly its declared dependencies
    let seen = report.seen_inputs.lock();
    assert_eq!(seen.len(), 1);
    let inputs = &seen[0];
    assert_eq!(inputs.len(), 2);
    assert_eq!(
        inputs.get(&ProcessorId::Grammar).unwrap()["grammar_score"],
        json!(0.9)
    );
    assert_eq!(
        inputs.get(&ProcessorId::Sentiment).unwrap()["sentiment"],
        json!("positive")
    );

    system.shutdown();
}

#[tokio::test]
async fn test_critical_failure_aborts_flow_and_runs_termination_once() {
    let registry = ProcessorRegistry::new();
    let abort_handler = Arc::new(ScriptedProcessor::succeeding(
        ProcessorId::AbortHandler,
        result("summary", json!("evaluation failed")),
    ));
    registry.register(Arc::new(ScriptedProcessor::succeeding(
        ProcessorId::Transcription,
        result("text", json!("hi")),
    )));
    registry.register(Arc::new(ScriptedProcessor::new(
        ProcessorId::Grammar,
        Box::new(|_| Err(ProcessorFailure::critical("submission audio is corrupt"))),
    )));
    registry.register(Arc::new(ScriptedProcessor::succeeding(
        ProcessorId::Sentiment,
        result("sentiment", json!("neutral")),
    )));
    registry.register(Arc::new(ScriptedProcessor::succeeding(
        ProcessorId::EvaluationReport,
        ResultMap::new(),
    )));
    registry.register(Arc::clone(&abort_handler) as Arc<dyn Processor>);

    let system = EventFlowSystem::start(fast_config(), registry).unwrap();
    let flow_id = system
        .orchestrator()
        .start_new_eventflow("default", ResultMap::new(), "user-2")
        .await
        .unwrap();

    let snapshot = wait_for_terminal(&system, flow_id).await;

    assert_eq!(snapshot.flow.status, FlowState::Aborted);
    assert_eq!(
        snapshot.processors[&ProcessorId::Grammar].status,
        ProcessorStatus::Aborted
    );
    assert!(snapshot.processors[&ProcessorId::Grammar]
        .error
        .as_ref()
        .unwrap()
        .message
        .contains("corrupt"));
    // the report never had its dependencies satisfied
    assert_eq!(
        snapshot.processors[&ProcessorId::EvaluationReport].status,
        ProcessorStatus::Aborted
    );
    assert_eq!(
        snapshot.processors[&ProcessorId::AbortHandler].status,
        ProcessorStatus::Completed
    );
    assert_eq!(abort_handler.calls.load(Ordering::SeqCst), 1);

    system.shutdown();
}

#[tokio::test]
async fn test_transient_failures_retry_until_success() {
    let registry = ProcessorRegistry::with_builtin_processors();
    let flaky = Arc::new(ScriptedProcessor::new(
        ProcessorId::Transcription,
        Box::new(|attempt| {
            if attempt < 3 {
                Err(ProcessorFailure::retriable("asr rate limited"))
            } else {
                Ok(ResultMap::new())
            }
        }),
    ));
    registry.register(Arc::clone(&flaky) as Arc<dyn Processor>);
    for id in [
        ProcessorId::Grammar,
        ProcessorId::Sentiment,
        ProcessorId::EvaluationReport,
    ] {
        registry.register(Arc::new(ScriptedProcessor::succeeding(id, ResultMap::new())));
    }

    let system = EventFlowSystem::start(fast_config(), registry).unwrap();
    let flow_id = system
        .orchestrator()
        .start_new_eventflow("default", ResultMap::new(), "user-3")
        .await
        .unwrap();

    let snapshot = wait_for_terminal(&system, flow_id).await;

    assert_eq!(snapshot.flow.status, FlowState::Completed);
    assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    let record = &snapshot.processors[&ProcessorId::Transcription];
    assert_eq!(record.status, ProcessorStatus::Completed);
    // the last transient failure stays recorded next to the final result
    assert_eq!(
        record.retriable_error.as_ref().unwrap().message,
        "asr rate limited"
    );

    system.shutdown();
}

#[tokio::test]
async fn test_exhausted_retries_fail_the_flow() {
    let registry = ProcessorRegistry::new();
    let abort_handler = Arc::new(ScriptedProcessor::succeeding(
        ProcessorId::AbortHandler,
        result("summary", json!("evaluation failed")),
    ));
    registry.register(Arc::new(ScriptedProcessor::new(
        ProcessorId::Transcription,
        Box::new(|_| Err(ProcessorFailure::retriable("asr backend down"))),
    )));
    for id in [
        ProcessorId::Grammar,
        ProcessorId::Sentiment,
        ProcessorId::EvaluationReport,
    ] {
        registry.register(Arc::new(ScriptedProcessor::succeeding(id, ResultMap::new())));
    }
    registry.register(Arc::clone(&abort_handler) as Arc<dyn Processor>);

    let system = EventFlowSystem::start(fast_config(), registry).unwrap();
    let flow_id = system
        .orchestrator()
        .start_new_eventflow("default", ResultMap::new(), "user-4")
        .await
        .unwrap();

    let snapshot = wait_for_terminal(&system, flow_id).await;

    assert_eq!(snapshot.flow.status, FlowState::Error);
    assert_eq!(
        snapshot.processors[&ProcessorId::Transcription].status,
        ProcessorStatus::Error
    );
    assert_eq!(abort_handler.calls.load(Ordering::SeqCst), 1);

    system.shutdown();
}

#[tokio::test]
async fn test_fallback_result_completes_degraded_and_feeds_dependents() {
    let registry = ProcessorRegistry::with_builtin_processors();
    let report = Arc::new(ScriptedProcessor::succeeding(
        ProcessorId::EvaluationReport,
        ResultMap::new(),
    ));
    registry.register(Arc::new(
        ScriptedProcessor::new(
            ProcessorId::Transcription,
            Box::new(|_| Err(ProcessorFailure::retriable("asr backend down"))),
        )
        .with_fallback(result("text", json!(""))),
    ));
    registry.register(Arc::new(ScriptedProcessor::succeeding(
        ProcessorId::Grammar,
        result("grammar_score", json!(0.0)),
    )));
    registry.register(Arc::new(ScriptedProcessor::succeeding(
        ProcessorId::Sentiment,
        result("sentiment", json!("unknown")),
    )));
    registry.register(Arc::clone(&report) as Arc<dyn Processor>);

    let system = EventFlowSystem::start(fast_config(), registry).unwrap();
    let flow_id = system
        .orchestrator()
        .start_new_eventflow("default", ResultMap::new(), "user-5")
        .await
        .unwrap();

    let snapshot = wait_for_terminal(&system, flow_id).await;

    // the degraded completion still counts as completion
    assert_eq!(snapshot.flow.status, FlowState::Completed);
    let transcription = &snapshot.processors[&ProcessorId::Transcription];
    assert_eq!(transcription.status, ProcessorStatus::CompletedWithError);
    assert_eq!(transcription.result.as_ref().unwrap()["text"], json!(""));
    assert!(transcription.error.is_some());

    assert_eq!(
        snapshot.processors[&ProcessorId::EvaluationReport].status,
        ProcessorStatus::Completed
    );

    system.shutdown();
}

#[tokio::test]
async fn test_unknown_flow_type_creates_no_state() {
    let system = EventFlowSystem::start(
        fast_config(),
        ProcessorRegistry::with_builtin_processors(),
    )
    .unwrap();

    let err = system
        .orchestrator()
        .start_new_eventflow("listening", ResultMap::new(), "user-6")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        eventflow_core::EventFlowError::UnknownFlowType("listening".to_string())
    );

    system.shutdown();
}
