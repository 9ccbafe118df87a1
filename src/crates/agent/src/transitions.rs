//! Transition routing for the agent graph.
//!
//! These functions determine the next node from the current state and the
//! action signal written by the node that just ran.

use crate::engine::EngineConfig;
use crate::signals::{ActionSignal, AgentNode};
use crate::state::AgentState;
use tracing::{info, warn};

/// Route after the planning node.
///
/// GENERAL_ANSWER and CLARIFICATION go straight to answering; everything
/// else (including a CODE_PLANNING signal with a clarification-sounding
/// rationale) falls through to code planning.
pub fn route_after_planning(state: &AgentState) -> AgentNode {
    match state.action_signal {
        ActionSignal::GeneralAnswer | ActionSignal::Clarification => {
            info!("Routing to answering (no code needed)");
            AgentNode::Answering
        }
        _ => {
            info!("Routing to code_planning");
            AgentNode::CodePlanning
        }
    }
}

/// Route after the code planning node.
pub fn route_after_code_planning(state: &AgentState) -> AgentNode {
    match state.action_signal {
        ActionSignal::TaskCompleted | ActionSignal::TaskFailed => {
            info!("Routing to answering (finalize)");
            AgentNode::Answering
        }
        _ => {
            // ITERATE_CURRENT_STEP and PROCEED_TO_NEXT_STEP both generate code.
            info!("Routing to code_generation");
            AgentNode::CodeGeneration
        }
    }
}

/// Route after the code execution node.
///
/// Successful executions go to the observer. Failed executions retry code
/// generation until the retry budget is spent; at the cap they go to the
/// observer anyway so the planner can escalate.
pub fn route_after_code_execution(state: &AgentState, max_code_retries: u32) -> AgentNode {
    if state.action_signal == ActionSignal::CodeExecutionSuccess {
        info!("Execution succeeded, routing to execution_observer");
        return AgentNode::ExecutionObserver;
    }

    if state.code_generation_attempts >= max_code_retries {
        warn!(
            attempts = state.code_generation_attempts,
            "Execution failed with generation retries exhausted, routing to execution_observer"
        );
        return AgentNode::ExecutionObserver;
    }

    info!(
        attempts = state.code_generation_attempts,
        "Execution failed, routing to code_generation for retry"
    );
    AgentNode::CodeGeneration
}

/// Route after the execution observer node.
///
/// Failed steps skip reflection and return directly to planning with the
/// failure context intact.
pub fn route_after_execution_observer(state: &AgentState) -> AgentNode {
    if state.current_step_success {
        info!("Step succeeded, routing to reflection");
        AgentNode::Reflection
    } else {
        info!("Step failed, routing to code_planning (skipping reflection)");
        AgentNode::CodePlanning
    }
}

/// Full transition table: next node after `current`, or `None` at END.
pub fn next_node(
    current: AgentNode,
    state: &AgentState,
    config: &EngineConfig,
) -> Option<AgentNode> {
    match current {
        AgentNode::Planning => Some(route_after_planning(state)),
        AgentNode::CodePlanning => Some(route_after_code_planning(state)),
        AgentNode::CodeGeneration => Some(AgentNode::CodeExecution),
        AgentNode::CodeExecution => {
            Some(route_after_code_execution(state, config.max_code_retries))
        }
        AgentNode::ExecutionObserver => Some(route_after_execution_observer(state)),
        AgentNode::Reflection => Some(AgentNode::CodePlanning),
        AgentNode::Answering => None,
    }
}
