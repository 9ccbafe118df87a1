//! The closed set of structured output schemas the workflow engine consumes.
//!
//! Every LLM call made by the engine requests exactly one of these types.
//! Each type carries a hand-written JSON schema that the provider clients
//! register as a forced tool call; the reply is decoded with serde. Decode
//! failures are surfaced as [`crate::LlmError::Schema`] after one recovery
//! attempt inside the gateway.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A named output schema the gateway can request from a provider.
pub trait StructuredOutput: DeserializeOwned {
    /// Tool/schema name sent to the provider.
    const NAME: &'static str;

    /// One-line description of what the output represents.
    const DESCRIPTION: &'static str;

    /// JSON schema for the expected payload.
    fn schema() -> Value;
}

/// Decision emitted by the PLANNING node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningDecision {
    /// Classification of the request.
    pub signal: PlanningSignal,
    /// Explanation of the task, or the reason a direct answer or
    /// clarification was chosen.
    pub rationale: String,
}

/// Signal values a [`PlanningDecision`] may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanningSignal {
    /// Task requires code execution.
    #[serde(rename = "CODE_PLANNING")]
    CodePlanning,
    /// Task is answerable directly.
    #[serde(rename = "GENERAL_ANSWER")]
    GeneralAnswer,
    /// Task is ambiguous; ask the user.
    #[serde(rename = "CLARIFICATION")]
    Clarification,
}

impl StructuredOutput for PlanningDecision {
    const NAME: &'static str = "planning_decision";
    const DESCRIPTION: &'static str =
        "Classify the user request as code execution, direct answer, or clarification";

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "signal": {
                    "type": "string",
                    "enum": ["CODE_PLANNING", "GENERAL_ANSWER", "CLARIFICATION"],
                    "description": "The decision signal"
                },
                "rationale": {
                    "type": "string",
                    "description": "Detailed explanation of the task for CODE_PLANNING, or the reason for choosing GENERAL_ANSWER or CLARIFICATION"
                }
            },
            "required": ["signal", "rationale"]
        })
    }
}

/// Decision emitted by the CODE_PLANNING node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodePlanningDecision {
    /// What to do next with the current step.
    pub signal: CodePlanningSignal,
    /// Goal for the current/next step. Empty on TASK_COMPLETED/TASK_FAILED.
    #[serde(default)]
    pub current_step_goal: String,
    /// Markdown description of what the step should do.
    #[serde(default)]
    pub current_step_description: String,
    /// Why this decision was made.
    #[serde(default)]
    pub reasoning: String,
    /// Brief summary of overall progress so far.
    #[serde(default)]
    pub progress_summary: String,
}

/// Signal values a [`CodePlanningDecision`] may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodePlanningSignal {
    /// Retry the current step with a new, distinct goal.
    #[serde(rename = "ITERATE_CURRENT_STEP")]
    IterateCurrentStep,
    /// Archive the current step and begin the next.
    #[serde(rename = "PROCEED_TO_NEXT_STEP")]
    ProceedToNextStep,
    /// The task is done.
    #[serde(rename = "TASK_COMPLETED")]
    TaskCompleted,
    /// The task cannot be completed.
    #[serde(rename = "TASK_FAILED")]
    TaskFailed,
}

impl StructuredOutput for CodePlanningDecision {
    const NAME: &'static str = "code_planning_decision";
    const DESCRIPTION: &'static str =
        "Decide whether to iterate the current step, proceed, or finish the task";

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "signal": {
                    "type": "string",
                    "enum": [
                        "ITERATE_CURRENT_STEP",
                        "PROCEED_TO_NEXT_STEP",
                        "TASK_COMPLETED",
                        "TASK_FAILED"
                    ],
                    "description": "The decision signal"
                },
                "current_step_goal": {
                    "type": "string",
                    "description": "Clear, small, specific goal for the current/next step (empty if TASK_COMPLETED or TASK_FAILED). Must differ from previously tried goals when iterating."
                },
                "current_step_description": {
                    "type": "string",
                    "description": "Detailed markdown description of what needs to be done (empty if TASK_COMPLETED or TASK_FAILED)"
                },
                "reasoning": {
                    "type": "string",
                    "description": "Explanation of why this decision was made"
                },
                "progress_summary": {
                    "type": "string",
                    "description": "Brief summary of overall progress so far"
                }
            },
            "required": ["signal"]
        })
    }
}

/// A single Python code blob emitted by the CODE_GENERATION node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PythonCode {
    /// Pure executable Python code, no markdown fences.
    pub code: String,
}

impl StructuredOutput for PythonCode {
    const NAME: &'static str = "python_code";
    const DESCRIPTION: &'static str = "A single executable Python code blob";

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "Pure executable Python code. Must NOT contain markdown code fences (```python or ```), backticks, or any other formatting. Should be directly executable as-is."
                }
            },
            "required": ["code"]
        })
    }
}

/// Whether an observation is plain evidence or a binding rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservationKind {
    /// A piece of evidence captured from an execution.
    Observation,
    /// A constraint that later steps must obey.
    Rule,
}

/// Where an observation originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservationSource {
    /// Derived from the data itself.
    Data,
    /// Stated by the task specification.
    Spec,
    /// Stated by the user.
    User,
}

impl ObservationSource {
    /// Conflict-resolution priority: spec dominates user dominates data.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Spec => 2,
            Self::User => 1,
            Self::Data => 0,
        }
    }
}

/// Atomic evidence item captured during a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepObservation {
    /// Short label for the observation.
    pub title: String,
    /// Free-text summary.
    pub summary: String,
    /// Evidence or rule.
    pub kind: ObservationKind,
    /// Origin of the observation.
    pub source: ObservationSource,
    /// Exact output string, kept verbatim for answers that must quote it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
    /// Importance rating, clamped to [1, 5] on read.
    #[serde(default = "default_rating")]
    pub importance: i64,
    /// Relevance rating, clamped to [1, 5] on read.
    #[serde(default = "default_rating")]
    pub relevance: i64,
    /// Step in which the observation was made. Filled in by the engine.
    #[serde(default)]
    pub step_number: u32,
}

fn default_rating() -> i64 {
    3
}

impl StepObservation {
    /// Importance clamped into the valid [1, 5] range.
    pub fn importance(&self) -> i64 {
        self.importance.clamp(1, 5)
    }

    /// Relevance clamped into the valid [1, 5] range.
    pub fn relevance(&self) -> i64 {
        self.relevance.clamp(1, 5)
    }
}

/// JSON schema fragment shared by every output that carries observations.
fn observation_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": {
                "type": "string",
                "description": "Short label for the observation"
            },
            "summary": {
                "type": "string",
                "description": "Free-text summary of the evidence"
            },
            "kind": {
                "type": "string",
                "enum": ["observation", "rule"],
                "description": "'rule' means later steps must obey it"
            },
            "source": {
                "type": "string",
                "enum": ["data", "spec", "user"],
                "description": "Where the observation originated"
            },
            "raw_output": {
                "type": "string",
                "description": "Exact output string, verbatim, when the answer must quote it"
            },
            "importance": {
                "type": "integer",
                "minimum": 1,
                "maximum": 5
            },
            "relevance": {
                "type": "integer",
                "minimum": 1,
                "maximum": 5
            }
        },
        "required": ["title", "summary", "kind", "source", "importance", "relevance"]
    })
}

/// Output of the EXECUTION_OBSERVER node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionObserverDecision {
    /// Whether the step's execution achieved its goal.
    pub execution_success: bool,
    /// Observations extracted from the execution transcript.
    #[serde(default)]
    pub observations: Vec<StepObservation>,
}

impl StructuredOutput for ExecutionObserverDecision {
    const NAME: &'static str = "execution_observer_decision";
    const DESCRIPTION: &'static str =
        "Judge the execution transcript and extract observations from it";

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "execution_success": {
                    "type": "boolean",
                    "description": "Whether the execution achieved the step goal"
                },
                "observations": {
                    "type": "array",
                    "items": observation_schema(),
                    "description": "Evidence items extracted from the transcript"
                }
            },
            "required": ["execution_success", "observations"]
        })
    }
}

/// Output of the REFLECTION node: the consolidated world observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectionDecision {
    /// Merged and deduplicated observation set.
    #[serde(default)]
    pub observations: Vec<StepObservation>,
}

impl StructuredOutput for ReflectionDecision {
    const NAME: &'static str = "reflection_decision";
    const DESCRIPTION: &'static str =
        "Merge new step observations into the consolidated world observations";

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "observations": {
                    "type": "array",
                    "items": observation_schema(),
                    "description": "The full merged observation set. Rules must never be dropped or demoted. Duplicates collapse; on conflict within the same kind and source, the higher step_number wins."
                }
            },
            "required": ["observations"]
        })
    }
}

/// Clarification questions for an ambiguous request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarificationResponse {
    /// Questions to ask the user, formatted as a helpful message.
    pub questions: String,
}

impl StructuredOutput for ClarificationResponse {
    const NAME: &'static str = "clarification_response";
    const DESCRIPTION: &'static str = "Clarification questions for an ambiguous request";

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "questions": {
                    "type": "string",
                    "description": "Clarification questions formatted as a clear, helpful message explaining what additional information is needed"
                }
            },
            "required": ["questions"]
        })
    }
}

/// Direct answer for a request that needs no code execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralAnswerResponse {
    /// Well-formatted markdown answer.
    pub answer: String,
}

impl StructuredOutput for GeneralAnswerResponse {
    const NAME: &'static str = "general_answer_response";
    const DESCRIPTION: &'static str = "Direct markdown answer without code execution";

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "answer": {
                    "type": "string",
                    "description": "A comprehensive markdown answer that directly addresses the user's request without requiring code execution"
                }
            },
            "required": ["answer"]
        })
    }
}

/// Artifact types the answering node may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactType {
    /// A single file in the sandbox.
    #[serde(rename = "FILE")]
    File,
    /// A directory in the sandbox.
    #[serde(rename = "FOLDER")]
    Folder,
}

/// One artifact the final answer references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDecision {
    /// File or folder.
    #[serde(rename = "type")]
    pub artifact_type: ArtifactType,
    /// What the artifact contains.
    pub description: String,
    /// Path inside the sandbox; resolved to absolute form by the engine.
    pub full_path: String,
}

/// Final answer synthesized by the ANSWERING node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAnswer {
    /// Description used for the attached notebook artifact.
    #[serde(default)]
    pub notebook_description: String,
    /// Markdown report or answer.
    pub answer: String,
    /// Whether the task succeeded.
    pub success: bool,
    /// Artifacts referenced by the answer, in presentation order.
    #[serde(default)]
    pub artifacts: Vec<ArtifactDecision>,
}

impl StructuredOutput for TaskAnswer {
    const NAME: &'static str = "task_answer";
    const DESCRIPTION: &'static str =
        "Final markdown report with the artifacts it references";

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "notebook_description": {
                    "type": "string",
                    "description": "Description for the attached notebook artifact"
                },
                "answer": {
                    "type": "string",
                    "description": "Markdown report: overview, key findings, results and interpretation, generated artifacts, conclusions"
                },
                "success": {
                    "type": "boolean",
                    "description": "Whether the task was completed successfully"
                },
                "artifacts": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "type": {
                                "type": "string",
                                "enum": ["FILE", "FOLDER"]
                            },
                            "description": {
                                "type": "string"
                            },
                            "full_path": {
                                "type": "string",
                                "description": "Path of the artifact inside the sandbox working directory"
                            }
                        },
                        "required": ["type", "description", "full_path"]
                    },
                    "description": "Artifacts generated during the task. Empty if none were created or requested."
                }
            },
            "required": ["answer", "success"]
        })
    }
}
