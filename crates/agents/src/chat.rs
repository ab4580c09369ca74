//! Chat agent - multi-turn conversation with memory kept in the session store
//!
//! With a [`Toolbox`] attached, the model may call web search and the profit
//! calculator before answering. Tool exchanges stay in the request; only the
//! user message and the final answer are stored.

use crate::llm::{ChatMessage, ChatModel, ModelTurn};
use crate::specialist::with_deadline;
use crate::store::{SessionLocks, SessionStore};
use crate::tools::Toolbox;
use crate::{AgentError, Result};
use agentflow_core::{Message, SessionRecord};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

const SYSTEM_PROMPT: &str =
    "You are a helpful agent that answers questions accurately, using the earlier turns of the conversation.";

const TOOL_PROMPT: &str = "You are a helpful agent that uses tools to answer questions accurately. \
Use search for facts and the calculator for math. Reason step by step.";

const DEFAULT_MAX_TOOL_ROUNDS: usize = 4;

pub struct ChatAgent {
    model: Arc<dyn ChatModel>,
    store: Arc<dyn SessionStore>,
    locks: SessionLocks,
    timeout: Duration,
    tools: Option<Toolbox>,
    max_tool_rounds: usize,
}

impl ChatAgent {
    pub fn new(model: Arc<dyn ChatModel>, store: Arc<dyn SessionStore>, timeout: Duration) -> Self {
        Self {
            model,
            store,
            locks: SessionLocks::new(),
            timeout,
            tools: None,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    /// Builder: share session locks with a workflow on the same store
    pub fn with_locks(mut self, locks: SessionLocks) -> Self {
        self.locks = locks;
        self
    }

    /// Builder: offer tools to the model
    pub fn with_tools(mut self, tools: Toolbox) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Builder: rounds of tool calls allowed before the model must answer
    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    /// Send one user turn and return the assistant's reply.
    ///
    /// The whole stored history goes to the model. Both messages are
    /// persisted only if the model answers.
    #[instrument(skip(self, text))]
    pub async fn ask(&self, session_id: &str, text: &str) -> Result<Message> {
        SessionRecord::validate_id(session_id)
            .map_err(|_| AgentError::InvalidSession(session_id.to_string()))?;

        let _guard = self.locks.acquire(session_id).await;

        let mut state = self.store.get(session_id).await?.unwrap_or_default();
        state.push(Message::user(text));

        let prompt = if self.tools.is_some() { TOOL_PROMPT } else { SYSTEM_PROMPT };
        let mut request = Vec::with_capacity(state.len() + 1);
        request.push(ChatMessage::system(prompt));
        request.extend(state.messages().iter().map(ChatMessage::from));

        let reply = self.answer(request).await?;

        let reply = Message::assistant(reply);
        state.push(reply.clone());
        self.store.put(session_id, &state).await?;

        info!("Session {} now has {} messages", session_id, state.len());
        Ok(reply)
    }

    /// Ask the model, running requested tools until it answers in text.
    /// The last round is sent without tools so the loop always ends.
    async fn answer(&self, mut request: Vec<ChatMessage>) -> Result<String> {
        let Some(tools) = &self.tools else {
            return with_deadline("chat completion", self.timeout, self.model.complete(&request)).await;
        };
        let specs = tools.specs();

        for round in 1..=self.max_tool_rounds {
            let turn = with_deadline(
                "chat completion",
                self.timeout,
                self.model.complete_with_tools(&request, &specs),
            )
            .await?;

            let calls = match turn {
                ModelTurn::Text(text) => return Ok(text),
                ModelTurn::ToolCalls(calls) => calls,
            };
            debug!("Round {}: model requested {} tool calls", round, calls.len());

            request.push(ChatMessage::tool_calls(calls.clone()));
            for call in &calls {
                let output = tools.invoke(call).await;
                request.push(ChatMessage::tool_result(call.id.clone(), output));
            }
        }

        with_deadline("chat completion", self.timeout, self.model.complete(&request)).await
    }
}
