//! Message types - the entries of a conversation

use crate::{Completion, Task};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single conversation entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Unique identifier
    pub id: Uuid,

    pub role: Role,

    /// The text of the message
    pub content: String,

    /// Specialist that emitted this message (assistant messages only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub produced_by: Option<Task>,

    /// Completion record the router reads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion: Option<Completion>,

    /// When this message was produced
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            produced_by: None,
            completion: None,
            created_at: Utc::now(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a plain assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Assistant message reporting a finished task
    pub fn task_done(task: Task, content: impl Into<String>) -> Self {
        let mut message = Self::assistant(content);
        message.produced_by = Some(task);
        message.completion = Some(Completion::done(task));
        message
    }

    /// Assistant message describing a failed task
    pub fn task_failed(task: Task, content: impl Into<String>) -> Self {
        let mut message = Self::assistant(content);
        message.produced_by = Some(task);
        message.completion = Some(Completion::failed(task));
        message
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    /// True if this assistant message marks `task` as done
    pub fn completes(&self, task: Task) -> bool {
        self.is_assistant()
            && self
                .completion
                .map(|c| c.task == task && c.is_done())
                .unwrap_or(false)
    }
}
