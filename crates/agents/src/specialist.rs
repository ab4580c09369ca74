//! Specialist handlers - one bounded unit of work per invocation

use crate::{AgentError, Result};
use agentflow_core::{ConversationState, Message, Task};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// A handler for one task of the plan.
///
/// `run` returns exactly one assistant message carrying a completion record
/// for [`Specialist::task`]. It never fails: a capability error becomes a
/// message with a failed completion, and the workflow appends it like any other.
#[async_trait]
pub trait Specialist: Send + Sync {
    fn task(&self) -> Task;

    async fn run(&self, state: &ConversationState) -> Message;
}

/// Run an external call under a deadline, mapping elapsed to `AgentError::Timeout`
pub async fn with_deadline<T, F>(what: &str, timeout: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(AgentError::Timeout(what.to_string(), timeout)),
    }
}

/// Failure message in the shape every specialist uses
pub(crate) fn failure(task: Task, error: &AgentError) -> Message {
    let verb = match task {
        Task::Research => "Research",
        Task::Calculate => "Calculation",
        Task::Summarize => "Summary",
    };
    Message::task_failed(task, format!("{} failed: {}", verb, error))
}
