//! Task types - the units of work a specialist performs

use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The capability a specialist provides
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    /// Look something up with web search
    Research,
    /// Compute figures from the request
    Calculate,
    /// Condense the conversation into a final answer
    Summarize,
}

impl Task {
    /// All tasks, in the default priority order
    pub const ALL: [Task; 3] = [Task::Research, Task::Calculate, Task::Summarize];
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Task::Research => write!(f, "research"),
            Task::Calculate => write!(f, "calculate"),
            Task::Summarize => write!(f, "summarize"),
        }
    }
}

impl FromStr for Task {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "research" | "researcher" => Ok(Task::Research),
            "calculate" | "calculator" => Ok(Task::Calculate),
            "summarize" | "summarizer" => Ok(Task::Summarize),
            other => Err(CoreError::UnknownTask(other.to_string())),
        }
    }
}

/// Outcome a specialist reports for its task
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Done,
    Failed,
}

/// Typed completion record attached to a specialist's message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Completion {
    pub task: Task,
    pub status: TaskStatus,
}

impl Completion {
    pub fn done(task: Task) -> Self {
        Self { task, status: TaskStatus::Done }
    }

    pub fn failed(task: Task) -> Self {
        Self { task, status: TaskStatus::Failed }
    }

    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }
}

/// Ordered list of tasks the supervisor works through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    tasks: Vec<Task>,
}

impl Plan {
    /// Create a plan; rejects empty plans and repeated tasks
    pub fn new(tasks: Vec<Task>) -> Result<Self> {
        if tasks.is_empty() {
            return Err(CoreError::Validation("plan must contain at least one task".into()));
        }
        for (i, task) in tasks.iter().enumerate() {
            if tasks[..i].contains(task) {
                return Err(CoreError::Validation(format!("task '{}' appears twice in plan", task)));
            }
        }
        Ok(Self { tasks })
    }

    /// Parse a comma-separated plan such as `research,calculate,summarize`
    pub fn parse(list: &str) -> Result<Self> {
        let tasks = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Task::from_str)
            .collect::<Result<Vec<_>>>()?;
        Self::new(tasks)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Default for Plan {
    fn default() -> Self {
        Self { tasks: Task::ALL.to_vec() }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.tasks.iter().map(Task::to_string).collect();
        write!(f, "{}", names.join(" -> "))
    }
}
