//! Workflow engine for the datalab code-execution agent.
//!
//! The engine is a deterministic finite-state machine over [`AgentState`],
//! composed of seven nodes:
//!
//! ```text
//!     START
//!       ↓
//!     [planning] ──────────→ GENERAL_ANSWER / CLARIFICATION ──→ [answering] ──→ END
//!       ↓ CODE_PLANNING
//!     [code_planning] ─────→ TASK_COMPLETED / TASK_FAILED ────→ [answering] ──→ END
//!       ↓ ITERATE / PROCEED
//!     [code_generation]
//!       ↓
//!     [code_execution]
//!       ↓ success, or failure with retries exhausted
//!     [execution_observer]
//!       │   ↓ step succeeded
//!       │ [reflection]
//!       ↓   ↓
//!     [code_planning]  (loop)
//! ```
//!
//! Every transition is driven by the [`ActionSignal`] written by the node
//! just executed, combined with the retry counters in the state; there is no
//! implicit global state. A hard cap on total node visits bounds the loop
//! even when the model's decisions would otherwise diverge.

pub mod engine;
pub mod error;
pub mod notebook;
pub mod observations;
pub mod prompts;
pub mod signals;
pub mod state;
pub mod traits;
pub mod transitions;
pub mod truncate;

mod nodes;

pub use engine::{EngineConfig, NodeModels, WorkflowEngine};
pub use error::{AgentError, Result};
pub use notebook::NotebookBuilder;
pub use observations::ObservationStore;
pub use signals::{ActionSignal, AgentNode};
pub use state::{AgentState, CompletedStep};
pub use traits::{Heartbeat, LanguageModel, SandboxRuntime};
pub use truncate::truncate_output;

// Re-export the structured output types the state is built from.
pub use llm::{
    ArtifactDecision, ArtifactType, ObservationKind, ObservationSource, StepObservation,
    TaskAnswer,
};
pub use sandbox::ExecutionResult;
