//! LLM provider gateway for datalab.
//!
//! This crate exposes a single operation to the workflow engine:
//! [`LlmClient::complete`], which sends a system+user message pair to a
//! configured provider and returns a value conforming to one of the closed
//! set of structured output schemas in [`outputs`].
//!
//! Structured outputs are requested through each provider's tool-call
//! mechanism: the output type's JSON schema is registered as the single
//! available tool and the provider is forced to call it. The reply is
//! decoded with serde; a decode failure triggers exactly one recovery
//! attempt with the parse error appended to the user message, after which
//! [`LlmError::Schema`] is surfaced to the caller.
//!
//! Clients are cheap to clone and safe for concurrent use across tasks.

pub mod config;
pub mod error;
pub mod outputs;
pub mod remote;

mod client;

pub use client::LlmClient;
pub use config::{LlmConfig, LlmProvider};
pub use error::{LlmError, Result};
pub use outputs::{
    ArtifactDecision, ArtifactType, ClarificationResponse, CodePlanningDecision,
    CodePlanningSignal, ExecutionObserverDecision, GeneralAnswerResponse, ObservationKind,
    ObservationSource, PlanningDecision, PlanningSignal, PythonCode, ReflectionDecision,
    StepObservation, StructuredOutput, TaskAnswer,
};
