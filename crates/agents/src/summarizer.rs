//! Summarizer - condenses the conversation with the language model

use crate::llm::{ChatMessage, ChatModel};
use crate::specialist::{failure, with_deadline, Specialist};
use agentflow_core::{ConversationState, Message, Task};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

const SUMMARY_PROMPT: &str = "You are the summarizer in a team of specialists. \
Write a concise final summary (at most five sentences) of the conversation below: \
the original request, what the research found and any calculated figures. \
Do not invent numbers that are not in the conversation.";

pub struct Summarizer {
    model: Arc<dyn ChatModel>,
    timeout: Duration,
}

impl Summarizer {
    pub fn new(model: Arc<dyn ChatModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }
}

#[async_trait]
impl Specialist for Summarizer {
    fn task(&self) -> Task {
        Task::Summarize
    }

    #[instrument(skip(self, state), fields(model = self.model.model_id()))]
    async fn run(&self, state: &ConversationState) -> Message {
        let messages = vec![
            ChatMessage::system(SUMMARY_PROMPT),
            ChatMessage::user(state.transcript()),
        ];
        info!("Summarizing {} messages", state.len());

        match with_deadline("summary completion", self.timeout, self.model.complete(&messages)).await {
            Ok(summary) => Message::task_done(Task::Summarize, format!("Final summary: {}", summary)),
            Err(e) => {
                warn!("Summary failed: {}", e);
                failure(Task::Summarize, &e)
            }
        }
    }
}
