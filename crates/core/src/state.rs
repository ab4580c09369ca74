//! Conversation state shared by the supervisor and its specialists

use crate::{Message, Role};
use serde::{Deserialize, Serialize};

/// Ordered, append-only message history
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConversationState {
    #[serde(default)]
    messages: Vec<Message>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a state with initial messages
    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Append a message; earlier messages are never touched
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn assistant_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.is_assistant())
    }

    /// Index of the most recent user message
    pub fn latest_user_index(&self) -> Option<usize> {
        self.messages.iter().rposition(|m| m.role == Role::User)
    }

    /// The request the specialists work on: the most recent user message
    pub fn latest_request(&self) -> Option<&str> {
        self.latest_user_index()
            .map(|i| self.messages[i].content.as_str())
    }

    /// Messages after the most recent user message
    pub fn current_turn(&self) -> &[Message] {
        match self.latest_user_index() {
            Some(i) => &self.messages[i + 1..],
            None => &self.messages,
        }
    }

    /// Plain-text rendering of the history, one `role: content` line each
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
