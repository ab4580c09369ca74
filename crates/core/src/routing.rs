//! Supervisor routing - picks the next specialist or ends the workflow

use crate::{ConversationState, CoreError, Message, Plan, Result, Task};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What the supervisor does next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingDecision {
    /// Hand the conversation to this specialist
    Dispatch(Task),
    /// Every planned task is done
    Done,
}

impl RoutingDecision {
    pub fn is_done(&self) -> bool {
        matches!(self, RoutingDecision::Done)
    }
}

impl std::fmt::Display for RoutingDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingDecision::Dispatch(task) => write!(f, "{}", task),
            RoutingDecision::Done => write!(f, "done"),
        }
    }
}

/// Which completions count toward the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingScope {
    /// Any completion anywhere in the session
    #[default]
    Session,
    /// Only completions after the most recent user message
    LatestTurn,
}

impl FromStr for RoutingScope {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "session" => Ok(RoutingScope::Session),
            "latest_turn" | "latest-turn" | "turn" => Ok(RoutingScope::LatestTurn),
            other => Err(CoreError::UnknownScope(other.to_string())),
        }
    }
}

/// Decides the next step from the message history alone.
///
/// The decision is a pure function of the state: the same history always
/// yields the same decision. Messages without a completion record (or with
/// a failed one) leave their task pending.
#[derive(Debug, Clone, Default)]
pub struct Router {
    plan: Plan,
    scope: RoutingScope,
}

impl Router {
    pub fn new(plan: Plan) -> Self {
        Self { plan, scope: RoutingScope::default() }
    }

    /// Builder: set routing scope
    pub fn with_scope(mut self, scope: RoutingScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn scope(&self) -> RoutingScope {
        self.scope
    }

    /// First planned task not yet done, or `Done`
    pub fn decide(&self, state: &ConversationState) -> RoutingDecision {
        let window: &[Message] = match self.scope {
            RoutingScope::Session => state.messages(),
            RoutingScope::LatestTurn => state.current_turn(),
        };

        self.plan
            .tasks()
            .iter()
            .copied()
            .find(|task| !window.iter().any(|m| m.completes(*task)))
            .map(RoutingDecision::Dispatch)
            .unwrap_or(RoutingDecision::Done)
    }

    /// Tasks already marked done within the routing scope, in plan order
    pub fn completed(&self, state: &ConversationState) -> Vec<Task> {
        let window: &[Message] = match self.scope {
            RoutingScope::Session => state.messages(),
            RoutingScope::LatestTurn => state.current_turn(),
        };
        self.plan
            .tasks()
            .iter()
            .copied()
            .filter(|task| window.iter().any(|m| m.completes(*task)))
            .collect()
    }
}
