//! The bounded workflow engine loop.

use crate::error::Result;
use crate::signals::{ActionSignal, AgentNode};
use crate::state::AgentState;
use crate::traits::{Heartbeat, LanguageModel, SandboxRuntime};
use crate::transitions;
use tracing::{info, warn};

/// Engine limits and sandbox-facing settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Hard cap on total node visits per task.
    pub max_graph_steps: u32,
    /// Step-attempt budget; exceeding it forces TASK_FAILED.
    pub max_step_retries: u32,
    /// Generation-attempt budget within one step; at the cap a failing
    /// execution routes to the observer instead of back to generation.
    pub max_code_retries: u32,
    /// Character budget for captured execution output.
    pub max_output_chars: usize,
    /// Head share of the truncation split.
    pub output_split_ratio: f64,
    /// Sandbox working directory artifacts are resolved against.
    pub working_directory: String,
    /// Filename the rendered notebook is saved under.
    pub notebook_filename: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_graph_steps: 250,
            max_step_retries: 3,
            max_code_retries: 5,
            max_output_chars: 25_000,
            output_split_ratio: 0.6,
            working_directory: "/home/user".to_string(),
            notebook_filename: "task_notebook.ipynb".to_string(),
        }
    }
}

/// One model endpoint per workflow node, plus a default for the
/// observer and reflection nodes.
#[derive(Clone)]
pub struct NodeModels<L> {
    /// Model for the planning node.
    pub planning: L,
    /// Model for the code planning node.
    pub code_planning: L,
    /// Model for the code generation node.
    pub code_generation: L,
    /// Model for the answering node.
    pub answering: L,
    /// Model for the observer and reflection nodes.
    pub default_model: L,
}

impl<L: Clone> NodeModels<L> {
    /// Use the same model for every node.
    pub fn uniform(model: L) -> Self {
        Self {
            planning: model.clone(),
            code_planning: model.clone(),
            code_generation: model.clone(),
            answering: model.clone(),
            default_model: model,
        }
    }
}

/// The finite-state workflow engine for one task.
///
/// Nodes run strictly sequentially on one logical thread of control; the
/// only suspension points are the LLM and sandbox calls. The engine never
/// returns an error for sandbox failures (they feed the observer path) and
/// always leaves a `task_answer` in the state when it returns `Ok`.
pub struct WorkflowEngine<L, S, H = ()> {
    pub(crate) models: NodeModels<L>,
    pub(crate) sandbox: S,
    pub(crate) heartbeat: H,
    pub(crate) config: EngineConfig,
}

impl<L, S, H> WorkflowEngine<L, S, H>
where
    L: LanguageModel,
    S: SandboxRuntime,
    H: Heartbeat,
{
    /// Create an engine for one task.
    pub fn new(models: NodeModels<L>, sandbox: S, heartbeat: H, config: EngineConfig) -> Self {
        Self {
            models,
            sandbox,
            heartbeat,
            config,
        }
    }

    /// The engine's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Drive the state machine from START to END.
    ///
    /// Returns `Err` only for LLM gateway failures; the coordinator converts
    /// those into a FAILED task. On `Ok`, `state.task_answer` is present.
    pub async fn run(&self, state: &mut AgentState) -> Result<()> {
        let mut node = AgentNode::Planning;
        let mut visits: u32 = 0;

        loop {
            if visits + 1 >= self.config.max_graph_steps && node != AgentNode::Answering {
                warn!(
                    visits,
                    budget = self.config.max_graph_steps,
                    "Graph step budget exhausted, forcing answering"
                );
                state.action_signal = ActionSignal::TaskFailed;
                state.failure_reason =
                    "Graph step budget exhausted before the task finished.".to_string();
                node = AgentNode::Answering;
            }

            visits += 1;
            self.heartbeat.touch();
            info!(node = %node, visit = visits, "Entering node");

            match node {
                AgentNode::Planning => self.planning_node(state).await?,
                AgentNode::CodePlanning => self.code_planning_node(state).await?,
                AgentNode::CodeGeneration => self.code_generation_node(state).await?,
                AgentNode::CodeExecution => self.code_execution_node(state).await,
                AgentNode::ExecutionObserver => self.execution_observer_node(state).await?,
                AgentNode::Reflection => self.reflection_node(state).await?,
                AgentNode::Answering => self.answering_node(state).await?,
            }

            match transitions::next_node(node, state, &self.config) {
                Some(next) => node = next,
                None => break,
            }
        }

        info!(visits, "Workflow finished");
        Ok(())
    }
}
