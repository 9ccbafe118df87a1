//! Action signals and node names for the agent state machine.

use serde::{Deserialize, Serialize};

/// Nodes of the workflow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentNode {
    /// Entry point: classify the request.
    Planning,
    /// Decide the next step action.
    CodePlanning,
    /// Generate code for the current step.
    CodeGeneration,
    /// Execute generated code in the sandbox.
    CodeExecution,
    /// Extract observations from the execution transcript.
    ExecutionObserver,
    /// Consolidate observations into the world set.
    Reflection,
    /// Produce the final answer.
    Answering,
}

impl AgentNode {
    /// Node name as it appears in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::CodePlanning => "code_planning",
            Self::CodeGeneration => "code_generation",
            Self::CodeExecution => "code_execution",
            Self::ExecutionObserver => "execution_observer",
            Self::Reflection => "reflection",
            Self::Answering => "answering",
        }
    }
}

impl std::fmt::Display for AgentNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Small enumerated value a node writes to direct the next transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionSignal {
    /// Initial value before any node has run.
    Start,
    /// Task requires code execution.
    CodePlanning,
    /// Task is answerable directly.
    GeneralAnswer,
    /// Task is ambiguous; ask the user.
    Clarification,
    /// Retry the current step with a new goal.
    IterateCurrentStep,
    /// Archive the current step and begin the next.
    ProceedToNextStep,
    /// The task is done.
    TaskCompleted,
    /// The task cannot be completed.
    TaskFailed,
    /// Run the generated code.
    ExecuteCode,
    /// The execution succeeded.
    CodeExecutionSuccess,
    /// The execution failed.
    CodeExecutionFailed,
    /// The final answer has been produced.
    FinalAnswer,
}

impl From<llm::PlanningSignal> for ActionSignal {
    fn from(signal: llm::PlanningSignal) -> Self {
        match signal {
            llm::PlanningSignal::CodePlanning => Self::CodePlanning,
            llm::PlanningSignal::GeneralAnswer => Self::GeneralAnswer,
            llm::PlanningSignal::Clarification => Self::Clarification,
        }
    }
}

impl From<llm::CodePlanningSignal> for ActionSignal {
    fn from(signal: llm::CodePlanningSignal) -> Self {
        match signal {
            llm::CodePlanningSignal::IterateCurrentStep => Self::IterateCurrentStep,
            llm::CodePlanningSignal::ProceedToNextStep => Self::ProceedToNextStep,
            llm::CodePlanningSignal::TaskCompleted => Self::TaskCompleted,
            llm::CodePlanningSignal::TaskFailed => Self::TaskFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_names() {
        assert_eq!(AgentNode::CodePlanning.as_str(), "code_planning");
        assert_eq!(AgentNode::ExecutionObserver.to_string(), "execution_observer");
    }

    #[test]
    fn test_planning_signal_conversion() {
        assert_eq!(
            ActionSignal::from(llm::PlanningSignal::GeneralAnswer),
            ActionSignal::GeneralAnswer
        );
    }

    #[test]
    fn test_code_planning_signal_conversion() {
        assert_eq!(
            ActionSignal::from(llm::CodePlanningSignal::ProceedToNextStep),
            ActionSignal::ProceedToNextStep
        );
    }
}
