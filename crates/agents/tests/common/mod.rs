//! Common test utilities

#![allow(dead_code)]

use agentflow_agents::{
    AgentError, ChatMessage, ChatModel, MemoryStore, ModelTurn, Result, SessionStore, ToolCall, ToolSpec, WebSearch,
    Workflow, WorkflowConfig,
};
use agentflow_core::{ConversationState, Message};
use agentflow_db::DbError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const REQUEST: &str =
    "Research X, calculate profit for $1,000,000 revenue / $700,000 cost, then summarize.";

pub fn request() -> Message {
    Message::user(REQUEST)
}

/// Search backend with scripted failures and call counting
#[derive(Default)]
pub struct MockSearch {
    calls: AtomicUsize,
    fail_first: usize,
    delay_first: Option<Duration>,
}

impl MockSearch {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failing_first(n: usize) -> Self {
        Self { fail_first: n, ..Self::default() }
    }

    pub fn always_failing() -> Self {
        Self::failing_first(usize::MAX)
    }

    pub fn slow_first(delay: Duration) -> Self {
        Self { delay_first: Some(delay), ..Self::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WebSearch for MockSearch {
    async fn search(&self, query: &str) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n == 0 {
            if let Some(delay) = self.delay_first {
                tokio::time::sleep(delay).await;
            }
        }
        if n < self.fail_first {
            return Err(AgentError::Capability("search backend unavailable".into()));
        }
        Ok(format!("Search results for '{}': X is a framework for stateful agents.", query))
    }
}

/// Model that records every request and answers with a fixed reply
pub struct MockModel {
    reply: String,
    pub requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockModel {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self { reply: reply.into(), requests: Mutex::new(Vec::new()) }
    }

    pub fn recorded(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for MockModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.requests.lock().unwrap().push(messages.to_vec());
        Ok(self.reply.clone())
    }

    fn model_id(&self) -> &str {
        "mock"
    }
}

/// Model that always errors
pub struct FailingModel;

#[async_trait]
impl ChatModel for FailingModel {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        Err(AgentError::Capability("model unavailable".into()))
    }

    fn model_id(&self) -> &str {
        "failing"
    }
}

/// Model that asks for scripted tool calls, then answers with the last tool output
pub struct ToolCallingModel {
    script: Mutex<Vec<Vec<ToolCall>>>,
    pub requests: Mutex<Vec<Vec<ChatMessage>>>,
    pub offered: Mutex<Vec<usize>>,
}

impl ToolCallingModel {
    /// One entry per round; rounds run in order before the text answer
    pub fn calling(rounds: Vec<Vec<ToolCall>>) -> Self {
        let mut script = rounds;
        script.reverse();
        Self {
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
            offered: Mutex::new(Vec::new()),
        }
    }

    pub fn recorded(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }

    fn answer(messages: &[ChatMessage]) -> String {
        match messages.iter().rev().find(|m| m.role == "tool") {
            Some(tool) => format!("Based on the tools: {}", tool.content),
            None => "No tools used.".to_string(),
        }
    }
}

#[async_trait]
impl ChatModel for ToolCallingModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.requests.lock().unwrap().push(messages.to_vec());
        Ok(Self::answer(messages))
    }

    async fn complete_with_tools(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Result<ModelTurn> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.offered.lock().unwrap().push(tools.len());
        match self.script.lock().unwrap().pop() {
            Some(calls) => Ok(ModelTurn::ToolCalls(calls)),
            None => Ok(ModelTurn::Text(Self::answer(messages))),
        }
    }

    fn model_id(&self) -> &str {
        "tool-calling"
    }
}

/// Session store whose writes start failing after a number of successes
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    puts_before_failure: usize,
    fail_gets: bool,
    puts: AtomicUsize,
}

impl FailingStore {
    pub fn failing_put_after(successes: usize) -> Self {
        Self { puts_before_failure: successes, ..Self::default() }
    }

    pub fn failing_get() -> Self {
        Self { fail_gets: true, ..Self::default() }
    }

    /// The backing store, with whatever was written before the failure
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

fn disk_full() -> AgentError {
    AgentError::Database(DbError::QueryFailed("disk full".into()))
}

#[async_trait]
impl SessionStore for FailingStore {
    async fn get(&self, session_id: &str) -> Result<Option<ConversationState>> {
        if self.fail_gets {
            return Err(disk_full());
        }
        self.inner.get(session_id).await
    }

    async fn put(&self, session_id: &str, state: &ConversationState) -> Result<()> {
        if self.puts.fetch_add(1, Ordering::SeqCst) >= self.puts_before_failure {
            return Err(disk_full());
        }
        self.inner.put(session_id, state).await
    }
}

/// Workflow over an in-memory store with the three standard specialists
pub fn memory_workflow(
    config: WorkflowConfig,
    search: Arc<MockSearch>,
) -> (Workflow, MemoryStore) {
    let store = MemoryStore::new();
    let model = Arc::new(MockModel::replying("X routes work between agents; profit is $300,000."));
    let workflow = Workflow::with_capabilities(config, Arc::new(store.clone()), search, model)
        .expect("standard plan has all specialists");
    (workflow, store)
}
