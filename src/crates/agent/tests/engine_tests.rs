//! End-to-end engine tests with scripted LLM replies and a sandbox stub.

use agent::{
    ActionSignal, AgentState, EngineConfig, Heartbeat, LanguageModel, NodeModels, SandboxRuntime,
    WorkflowEngine,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use sandbox::{DataFile, ExecutionError, ExecutionResult};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Replays a queue of JSON replies, one per LLM call, in call order.
#[derive(Clone, Default)]
struct ScriptedModel {
    replies: Arc<Mutex<VecDeque<Value>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedModel {
    fn new(replies: Vec<Value>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn remaining(&self) -> usize {
        self.replies.lock().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete<T>(&self, _system: &str, _user: &str) -> llm::Result<T>
    where
        T: llm::StructuredOutput + Send,
    {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .replies
            .lock()
            .pop_front()
            .ok_or_else(|| llm::LlmError::Unavailable("script exhausted".to_string()))?;
        serde_json::from_value(reply).map_err(|e| llm::LlmError::schema(T::NAME, e.to_string()))
    }
}

/// Sandbox stub that replays execution outcomes and counts lifecycle calls.
#[derive(Clone, Default)]
struct StubSandbox {
    executions: Arc<Mutex<VecDeque<Result<ExecutionResult, String>>>>,
    executed_code: Arc<Mutex<Vec<String>>>,
    contexts_recreated: Arc<AtomicUsize>,
    notebooks_saved: Arc<AtomicUsize>,
}

impl StubSandbox {
    fn with_executions(executions: Vec<Result<ExecutionResult, String>>) -> Self {
        Self {
            executions: Arc::new(Mutex::new(executions.into())),
            ..Default::default()
        }
    }

    fn executed_code(&self) -> Vec<String> {
        self.executed_code.lock().clone()
    }
}

#[async_trait]
impl SandboxRuntime for StubSandbox {
    async fn create_sandbox(&self) -> sandbox::Result<String> {
        Ok("sbx-test".to_string())
    }

    async fn destroy_sandbox(&self, _sandbox_id: &str) -> sandbox::Result<()> {
        Ok(())
    }

    async fn upload_files(
        &self,
        _sandbox_id: &str,
        files: &[DataFile],
        target_folder: &str,
    ) -> sandbox::Result<Vec<String>> {
        Ok(files
            .iter()
            .map(|f| format!("{}/{}", target_folder, f.filename))
            .collect())
    }

    async fn execute_code(
        &self,
        _sandbox_id: &str,
        code: &str,
    ) -> sandbox::Result<ExecutionResult> {
        self.executed_code.lock().push(code.to_string());
        match self.executions.lock().pop_front() {
            Some(Ok(result)) => Ok(result),
            Some(Err(message)) => Err(sandbox::SandboxError::Provider(message)),
            None => Ok(ExecutionResult::default()),
        }
    }

    async fn recreate_context(&self, _sandbox_id: &str) -> sandbox::Result<()> {
        self.contexts_recreated.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn download_file(&self, _sandbox_id: &str, _path: &str) -> sandbox::Result<Vec<u8>> {
        Ok(Vec::new())
    }

    async fn path_exists(&self, _sandbox_id: &str, _path: &str) -> sandbox::Result<bool> {
        Ok(true)
    }

    async fn list_tree(&self, _sandbox_id: &str, _root: &str) -> sandbox::Result<String> {
        Ok("out.png\ntask_notebook.ipynb".to_string())
    }

    async fn save_notebook(
        &self,
        _sandbox_id: &str,
        _notebook: &Value,
        filename: &str,
    ) -> sandbox::Result<String> {
        self.notebooks_saved.fetch_add(1, Ordering::SeqCst);
        Ok(format!("/home/user/{}", filename))
    }

    async fn upload_to_remote_store(
        &self,
        _sandbox_id: &str,
        _source_path: &str,
        _key: &str,
        _delete_source: bool,
    ) -> sandbox::Result<()> {
        Ok(())
    }

    async fn download_from_remote_store(
        &self,
        _sandbox_id: &str,
        _keys: &[String],
        _target_folder: &str,
    ) -> sandbox::Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn working_directory(&self) -> &str {
        "/home/user"
    }

    fn data_directory(&self) -> &str {
        "/home/user/data"
    }

    fn remote_storage_enabled(&self) -> bool {
        false
    }
}

/// Counts heartbeat touches; each node entry must produce exactly one.
#[derive(Clone, Default)]
struct CountingHeartbeat(Arc<AtomicUsize>);

impl Heartbeat for CountingHeartbeat {
    fn touch(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

fn engine(
    model: ScriptedModel,
    sandbox: StubSandbox,
    config: EngineConfig,
) -> WorkflowEngine<ScriptedModel, StubSandbox, CountingHeartbeat> {
    WorkflowEngine::new(
        NodeModels::uniform(model),
        sandbox,
        CountingHeartbeat::default(),
        config,
    )
}

fn state(task: &str) -> AgentState {
    AgentState::new(task, "", vec![], "sbx-test", "task-1")
}

fn iterate_decision(goal: &str) -> Value {
    json!({
        "signal": "ITERATE_CURRENT_STEP",
        "current_step_goal": goal,
        "current_step_description": format!("Do this: {}", goal),
        "reasoning": "next step"
    })
}

fn observer_decision(success: bool) -> Value {
    json!({
        "execution_success": success,
        "observations": [{
            "title": "printed",
            "summary": "hello",
            "kind": "observation",
            "source": "data",
            "importance": 3,
            "relevance": 5
        }]
    })
}

fn reflection_keep() -> Value {
    json!({
        "observations": [{
            "title": "printed",
            "summary": "hello",
            "kind": "observation",
            "source": "data",
            "importance": 3,
            "relevance": 5,
            "step_number": 0
        }]
    })
}

fn final_answer(answer: &str, success: bool) -> Value {
    json!({
        "notebook_description": "Steps taken",
        "answer": answer,
        "success": success,
        "artifacts": []
    })
}

#[tokio::test]
async fn direct_answer_skips_the_sandbox() {
    let model = ScriptedModel::new(vec![
        json!({"signal": "GENERAL_ANSWER", "rationale": "arithmetic"}),
        json!({"answer": "4"}),
    ]);
    let sandbox = StubSandbox::default();
    let engine = engine(model.clone(), sandbox.clone(), EngineConfig::default());

    let mut state = state("What is 2+2?");
    engine.run(&mut state).await.unwrap();

    let answer = state.task_answer.unwrap();
    assert!(answer.success);
    assert_eq!(answer.answer, "4");
    assert!(answer.artifacts.is_empty());
    assert!(state.completed_steps.is_empty());
    assert!(sandbox.executed_code().is_empty());
    assert_eq!(model.remaining(), 0);
}

#[tokio::test]
async fn clarification_produces_unsuccessful_answer() {
    let model = ScriptedModel::new(vec![
        json!({"signal": "CLARIFICATION", "rationale": "which dataset?"}),
        json!({"questions": "Which dataset should I analyze?"}),
    ]);
    let engine = engine(model, StubSandbox::default(), EngineConfig::default());

    let mut state = state("analyze it");
    engine.run(&mut state).await.unwrap();

    let answer = state.task_answer.unwrap();
    assert!(!answer.success);
    assert!(answer.answer.contains("Which dataset"));
}

#[tokio::test]
async fn single_step_success_archives_one_step() {
    let model = ScriptedModel::new(vec![
        json!({"signal": "CODE_PLANNING", "rationale": "needs code"}),
        iterate_decision("print hello"),
        json!({"code": "print('hello')"}),
        observer_decision(true),
        reflection_keep(),
        json!({"signal": "TASK_COMPLETED", "reasoning": "done"}),
        final_answer("# Report\n\nPrinted hello.", true),
    ]);
    let sandbox = StubSandbox::with_executions(vec![Ok(ExecutionResult {
        stdout: vec!["hello".to_string()],
        ..Default::default()
    })]);
    let heartbeats = CountingHeartbeat::default();
    let engine = WorkflowEngine::new(
        NodeModels::uniform(model.clone()),
        sandbox.clone(),
        heartbeats.clone(),
        EngineConfig::default(),
    );

    let mut state = state("print hello");
    engine.run(&mut state).await.unwrap();

    let answer = state.task_answer.unwrap();
    assert!(answer.success);
    assert!(answer.answer.contains("hello"));

    // Exactly one archived step, successful, with the executed code.
    assert_eq!(state.completed_steps.len(), 1);
    let step = &state.completed_steps[0];
    assert_eq!(step.step_number, 0);
    assert!(step.success);
    assert_eq!(step.code, "print('hello')");
    assert_eq!(step.observations.len(), 1);

    // The notebook was saved and attached as an extra FILE artifact.
    assert_eq!(sandbox.notebooks_saved.load(Ordering::SeqCst), 1);
    assert_eq!(answer.artifacts.len(), 1);
    assert_eq!(answer.artifacts[0].full_path, "/home/user/task_notebook.ipynb");

    // planning, code_planning, generation, execution, observer, reflection,
    // code_planning, answering: eight node entries, eight heartbeats.
    assert_eq!(heartbeats.0.load(Ordering::SeqCst), 8);
    assert_eq!(model.remaining(), 0);
}

#[tokio::test]
async fn failed_execution_retries_generation_then_succeeds() {
    let model = ScriptedModel::new(vec![
        json!({"signal": "CODE_PLANNING", "rationale": "needs code"}),
        iterate_decision("print hello"),
        json!({"code": "print(hello)"}),
        json!({"code": "print('hello')"}),
        observer_decision(true),
        reflection_keep(),
        json!({"signal": "TASK_COMPLETED", "reasoning": "done"}),
        final_answer("done", true),
    ]);
    let sandbox = StubSandbox::with_executions(vec![
        Ok(ExecutionResult {
            error: Some(ExecutionError {
                name: "NameError".to_string(),
                value: "name 'hello' is not defined".to_string(),
                traceback: String::new(),
            }),
            ..Default::default()
        }),
        Ok(ExecutionResult {
            stdout: vec!["hello".to_string()],
            ..Default::default()
        }),
    ]);
    let engine = engine(model.clone(), sandbox.clone(), EngineConfig::default());

    let mut state = state("print hello");
    engine.run(&mut state).await.unwrap();

    let answer = state.task_answer.unwrap();
    assert!(answer.success);

    // Two generation attempts, the second one archived.
    assert_eq!(sandbox.executed_code().len(), 2);
    assert_eq!(state.completed_steps.len(), 1);
    assert_eq!(state.completed_steps[0].code, "print('hello')");

    // The failed attempt recreated the execution context.
    assert_eq!(sandbox.contexts_recreated.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn gateway_error_is_captured_not_raised() {
    let model = ScriptedModel::new(vec![
        json!({"signal": "CODE_PLANNING", "rationale": "needs code"}),
        iterate_decision("load data"),
        json!({"code": "open('missing.csv')"}),
        json!({"code": "open('data.csv')"}),
        observer_decision(true),
        reflection_keep(),
        json!({"signal": "TASK_COMPLETED", "reasoning": "done"}),
        final_answer("done", true),
    ]);
    let sandbox = StubSandbox::with_executions(vec![
        Err("sandbox connection reset".to_string()),
        Ok(ExecutionResult::default()),
    ]);
    let engine = engine(model, sandbox.clone(), EngineConfig::default());

    let mut state = state("load data");
    engine.run(&mut state).await.unwrap();

    assert!(state.task_answer.unwrap().success);
    assert_eq!(sandbox.contexts_recreated.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn step_attempts_exhaustion_fails_the_task() {
    // MAX_STEP_RETRIES is 3: attempts 1..=3 are allowed, the planner entry
    // that finds step_attempts == 4 short-circuits to TASK_FAILED.
    let mut replies = vec![json!({"signal": "CODE_PLANNING", "rationale": "needs code"})];
    for _ in 0..4 {
        replies.push(iterate_decision("same goal"));
        replies.push(json!({"code": "do_something()"}));
        replies.push(observer_decision(false));
    }
    replies.push(final_answer("could not finish", false));

    let model = ScriptedModel::new(replies);
    let executions = (0..4).map(|_| Ok(ExecutionResult::default())).collect();
    let sandbox = StubSandbox::with_executions(executions);
    let engine = engine(model.clone(), sandbox, EngineConfig::default());

    let mut state = state("impossible task");
    engine.run(&mut state).await.unwrap();

    assert!(state.failure_reason.starts_with("Exceeded maximum attempts"));
    let answer = state.task_answer.unwrap();
    assert!(!answer.success);
    assert_eq!(model.remaining(), 0);
}

#[tokio::test]
async fn generation_retries_exhausted_route_to_observer() {
    // Five failing executions exhaust MAX_CODE_RETRIES; the fifth failure
    // goes to the observer, which reports failure back to the planner.
    let model = ScriptedModel::new(vec![
        json!({"signal": "CODE_PLANNING", "rationale": "needs code"}),
        iterate_decision("parse file"),
        json!({"code": "attempt_1()"}),
        json!({"code": "attempt_2()"}),
        json!({"code": "attempt_3()"}),
        json!({"code": "attempt_4()"}),
        json!({"code": "attempt_5()"}),
        observer_decision(false),
        json!({"signal": "TASK_FAILED", "reasoning": "file is unparseable"}),
        final_answer("could not parse", false),
    ]);
    let executions = (0..5)
        .map(|_| Err("boom".to_string()))
        .collect::<Vec<_>>();
    let sandbox = StubSandbox::with_executions(executions);
    let engine = engine(model.clone(), sandbox.clone(), EngineConfig::default());

    let mut state = state("parse the file");
    engine.run(&mut state).await.unwrap();

    assert_eq!(sandbox.executed_code().len(), 5);
    assert_eq!(state.failure_reason, "file is unparseable");
    assert!(!state.task_answer.unwrap().success);
    assert_eq!(model.remaining(), 0);
}

#[tokio::test]
async fn graph_budget_forces_failure_answer() {
    let model = ScriptedModel::new(vec![
        json!({"signal": "CODE_PLANNING", "rationale": "needs code"}),
        iterate_decision("loop"),
        json!({"code": "spin()"}),
        observer_decision(false),
        final_answer("budget exhausted", false),
    ]);
    let sandbox = StubSandbox::with_executions(vec![Ok(ExecutionResult::default())]);

    let config = EngineConfig {
        max_graph_steps: 6,
        ..Default::default()
    };
    let heartbeats = CountingHeartbeat::default();
    let engine = WorkflowEngine::new(
        NodeModels::uniform(model),
        sandbox,
        heartbeats.clone(),
        config,
    );

    let mut state = state("spin forever");
    engine.run(&mut state).await.unwrap();

    assert!(state.failure_reason.contains("budget exhausted"));
    assert!(!state.task_answer.unwrap().success);
    assert_eq!(state.action_signal, ActionSignal::FinalAnswer);

    // Node visits never exceed the configured budget.
    assert!(heartbeats.0.load(Ordering::SeqCst) <= 6);
}

#[tokio::test]
async fn llm_failure_aborts_the_run() {
    // Script exhausts after planning; the next call surfaces a gateway error.
    let model = ScriptedModel::new(vec![json!({
        "signal": "CODE_PLANNING",
        "rationale": "needs code"
    })]);
    let engine = engine(model, StubSandbox::default(), EngineConfig::default());

    let mut state = state("anything");
    let result = engine.run(&mut state).await;

    assert!(result.is_err());
    assert!(state.task_answer.is_none());
}

#[tokio::test]
async fn proceed_increments_step_number_monotonically() {
    let model = ScriptedModel::new(vec![
        json!({"signal": "CODE_PLANNING", "rationale": "needs code"}),
        iterate_decision("step zero"),
        json!({"code": "a()"}),
        observer_decision(true),
        reflection_keep(),
        json!({
            "signal": "PROCEED_TO_NEXT_STEP",
            "current_step_goal": "step one",
            "current_step_description": "next",
            "reasoning": "first step done"
        }),
        json!({"code": "b()"}),
        observer_decision(true),
        reflection_keep(),
        json!({"signal": "TASK_COMPLETED", "reasoning": "done"}),
        final_answer("done", true),
    ]);
    let sandbox = StubSandbox::with_executions(vec![
        Ok(ExecutionResult::default()),
        Ok(ExecutionResult::default()),
    ]);
    let engine = engine(model.clone(), sandbox, EngineConfig::default());

    let mut state = state("two steps");
    engine.run(&mut state).await.unwrap();

    assert_eq!(state.completed_steps.len(), 2);
    assert_eq!(state.completed_steps[0].step_number, 0);
    assert_eq!(state.completed_steps[0].goal, "step zero");
    assert_eq!(state.completed_steps[1].step_number, 1);
    assert_eq!(state.completed_steps[1].goal, "step one");
    assert_eq!(model.remaining(), 0);
}
