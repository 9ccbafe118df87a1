//! Shared scripted stand-ins for the coordinator tests.

use agent::{LanguageModel, SandboxRuntime};
use async_trait::async_trait;
use parking_lot::Mutex;
use sandbox::{DataFile, ExecutionResult};
use serde_json::{json, Value};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Replays a queue of JSON replies, one per LLM call, in call order.
#[derive(Clone, Default)]
pub struct ScriptedModel {
    replies: Arc<Mutex<VecDeque<Value>>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Value>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
        }
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete<T>(&self, _system: &str, _user: &str) -> llm::Result<T>
    where
        T: llm::StructuredOutput + Send,
    {
        let reply = self
            .replies
            .lock()
            .pop_front()
            .ok_or_else(|| llm::LlmError::Unavailable("script exhausted".to_string()))?;
        serde_json::from_value(reply).map_err(|e| llm::LlmError::schema(T::NAME, e.to_string()))
    }
}

/// Sandbox stub with lifecycle counters and configurable missing paths.
#[derive(Clone, Default)]
pub struct StubSandbox {
    pub created: Arc<AtomicUsize>,
    pub destroyed: Arc<AtomicUsize>,
    pub uploads: Arc<Mutex<Vec<String>>>,
    pub missing_paths: Arc<Mutex<HashSet<String>>>,
    pub fail_create: Arc<Mutex<bool>>,
}

impl StubSandbox {
    pub fn mark_missing(&self, path: &str) {
        self.missing_paths.lock().insert(path.to_string());
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SandboxRuntime for StubSandbox {
    async fn create_sandbox(&self) -> sandbox::Result<String> {
        if *self.fail_create.lock() {
            return Err(sandbox::SandboxError::Provider("no capacity".to_string()));
        }
        let n = self.created.fetch_add(1, Ordering::SeqCst);
        Ok(format!("sbx-{}", n))
    }

    async fn destroy_sandbox(&self, _sandbox_id: &str) -> sandbox::Result<()> {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn upload_files(
        &self,
        _sandbox_id: &str,
        files: &[DataFile],
        target_folder: &str,
    ) -> sandbox::Result<Vec<String>> {
        let paths: Vec<String> = files
            .iter()
            .map(|f| format!("{}/{}", target_folder, f.filename))
            .collect();
        self.uploads.lock().extend(paths.clone());
        Ok(paths)
    }

    async fn execute_code(
        &self,
        _sandbox_id: &str,
        _code: &str,
    ) -> sandbox::Result<ExecutionResult> {
        Ok(ExecutionResult {
            stdout: vec!["ok".to_string()],
            ..Default::default()
        })
    }

    async fn recreate_context(&self, _sandbox_id: &str) -> sandbox::Result<()> {
        Ok(())
    }

    async fn download_file(&self, _sandbox_id: &str, path: &str) -> sandbox::Result<Vec<u8>> {
        Ok(format!("bytes-of:{}", path).into_bytes())
    }

    async fn path_exists(&self, _sandbox_id: &str, path: &str) -> sandbox::Result<bool> {
        Ok(!self.missing_paths.lock().contains(path))
    }

    async fn list_tree(&self, _sandbox_id: &str, _root: &str) -> sandbox::Result<String> {
        Ok("out.png".to_string())
    }

    async fn save_notebook(
        &self,
        _sandbox_id: &str,
        _notebook: &Value,
        filename: &str,
    ) -> sandbox::Result<String> {
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
        keys: &[String],
        target_folder: &str,
    ) -> sandbox::Result<Vec<String>> {
        Ok(keys
            .iter()
            .map(|key| {
                let name = key.rsplit('/').next().unwrap_or(key);
                format!("{}/{}", target_folder, name)
            })
            .collect())
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

/// Script for a direct GENERAL_ANSWER task.
pub fn direct_answer_script(answer: &str) -> Vec<Value> {
    vec![
        json!({"signal": "GENERAL_ANSWER", "rationale": "simple"}),
        json!({"answer": answer}),
    ]
}

/// Script for a single successful code step ending in `TaskAnswer`.
pub fn single_step_script(artifacts: Value) -> Vec<Value> {
    vec![
        json!({"signal": "CODE_PLANNING", "rationale": "needs code"}),
        json!({
            "signal": "ITERATE_CURRENT_STEP",
            "current_step_goal": "do the work",
            "current_step_description": "run it",
            "reasoning": "start"
        }),
        json!({"code": "print('ok')"}),
        json!({
            "execution_success": true,
            "observations": [{
                "title": "ran",
                "summary": "ok",
                "kind": "observation",
                "source": "data",
                "importance": 3,
                "relevance": 3
            }]
        }),
        json!({"observations": []}),
        json!({"signal": "TASK_COMPLETED", "reasoning": "done"}),
        json!({
            "notebook_description": "steps",
            "answer": "# Report\n\nDone.",
            "success": true,
            "artifacts": artifacts
        }),
    ]
}
