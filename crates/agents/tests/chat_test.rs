mod common;

use agentflow_agents::{AgentError, ChatAgent, MemoryStore, SessionStore, ToolCall, Toolbox};
use agentflow_core::Role;
use common::{FailingModel, FailingStore, MockModel, MockSearch, ToolCallingModel};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_chat_remembers_earlier_turns() {
    let model = Arc::new(MockModel::replying("LangGraph is a library for stateful agents."));
    let store = MemoryStore::new();
    let agent = ChatAgent::new(model.clone(), Arc::new(store.clone()), Duration::from_secs(5));

    let first = agent.ask("chat", "What is LangGraph?").await.unwrap();
    assert_eq!(first.role, Role::Assistant);
    assert_eq!(first.content, "LangGraph is a library for stateful agents.");

    agent.ask("chat", "Who maintains it?").await.unwrap();

    let requests = model.recorded();
    assert_eq!(requests.len(), 2);

    // system prompt + question
    assert_eq!(requests[0].len(), 2);
    assert_eq!(requests[0][0].role, "system");

    // system prompt + first question + first answer + second question
    let second = &requests[1];
    assert_eq!(second.len(), 4);
    assert_eq!(second[1].content, "What is LangGraph?");
    assert_eq!(second[2].role, "assistant");
    assert_eq!(second[3].content, "Who maintains it?");

    let stored = store.get("chat").await.unwrap().unwrap();
    assert_eq!(stored.len(), 4);
}

#[tokio::test]
async fn test_chat_sessions_are_isolated() {
    let model = Arc::new(MockModel::replying("ok"));
    let agent = ChatAgent::new(model.clone(), Arc::new(MemoryStore::new()), Duration::from_secs(5));

    agent.ask("one", "first").await.unwrap();
    agent.ask("two", "second").await.unwrap();

    let requests = model.recorded();
    assert_eq!(requests[1].len(), 2);
    assert_eq!(requests[1][1].content, "second");
}

#[tokio::test]
async fn test_failed_chat_persists_nothing() {
    let store = MemoryStore::new();
    let agent = ChatAgent::new(Arc::new(FailingModel), Arc::new(store.clone()), Duration::from_secs(5));

    let err = agent.ask("broken", "hello?").await.unwrap_err();
    assert!(matches!(err, AgentError::Capability(_)));
    assert!(store.get("broken").await.unwrap().is_none());
}

#[tokio::test]
async fn test_chat_rejects_blank_session() {
    let agent = ChatAgent::new(
        Arc::new(MockModel::replying("ok")),
        Arc::new(MemoryStore::new()),
        Duration::from_secs(5),
    );
    let err = agent.ask("", "hi").await.unwrap_err();
    assert!(matches!(err, AgentError::InvalidSession(_)));
}

#[tokio::test]
async fn test_failed_write_returns_error() {
    let store = Arc::new(FailingStore::failing_put_after(0));
    let model = Arc::new(MockModel::replying("answer"));
    let agent = ChatAgent::new(model.clone(), store.clone(), Duration::from_secs(5));

    let err = agent.ask("disk", "hello?").await.unwrap_err();
    assert!(matches!(err, AgentError::Database(_)));
    assert_eq!(model.recorded().len(), 1);
    assert!(store.inner().is_empty().await);
}

#[tokio::test]
async fn test_failed_read_skips_the_model() {
    let model = Arc::new(MockModel::replying("answer"));
    let agent = ChatAgent::new(model.clone(), Arc::new(FailingStore::failing_get()), Duration::from_secs(5));

    let err = agent.ask("disk", "hello?").await.unwrap_err();
    assert!(matches!(err, AgentError::Database(_)));
    assert!(model.recorded().is_empty());
}

fn toolbox(search: Arc<MockSearch>) -> Toolbox {
    Toolbox::new(search, Duration::from_secs(5))
}

/// The model calls search and the calculator before answering
#[tokio::test]
async fn test_tool_calls_are_run_and_fed_back() {
    let search = Arc::new(MockSearch::ok());
    let model = Arc::new(ToolCallingModel::calling(vec![
        vec![ToolCall::new("call_1", "web_search", r#"{"query":"latest LangChain version"}"#)],
        vec![ToolCall::new("call_2", "calculate_profit", r#"{"revenue":500000,"cost":350000}"#)],
    ]));
    let store = MemoryStore::new();
    let agent = ChatAgent::new(model.clone(), Arc::new(store.clone()), Duration::from_secs(5))
        .with_tools(toolbox(search.clone()));

    let reply = agent
        .ask("tools", "Search latest LangChain version. If revenue $500k and cost $350k, what's profit?")
        .await
        .unwrap();

    assert_eq!(reply.content, "Based on the tools: Profit $150,000 (revenue $500,000 - cost $350,000)");
    assert_eq!(search.calls(), 1);
    assert_eq!(*model.offered.lock().unwrap(), vec![2, 2, 2]);

    // Each round carries the earlier calls and their results
    let requests = model.recorded();
    assert_eq!(requests.len(), 3);
    let last = &requests[2];
    assert_eq!(last[2].tool_calls[0].function.name, "web_search");
    assert_eq!(last[3].role, "tool");
    assert_eq!(last[3].tool_call_id.as_deref(), Some("call_1"));
    assert!(last[3].content.starts_with("Search results for 'latest LangChain version'"));
    assert_eq!(last[5].tool_call_id.as_deref(), Some("call_2"));

    // Only the question and the answer are kept
    let stored = store.get("tools").await.unwrap().unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored.messages()[1], reply);
}

/// A model that keeps calling tools is made to answer after the round limit
#[tokio::test]
async fn test_tool_rounds_are_bounded() {
    let call = || vec![ToolCall::new("again", "web_search", r#"{"query":"more"}"#)];
    let model = Arc::new(ToolCallingModel::calling(vec![call(), call(), call(), call(), call()]));
    let search = Arc::new(MockSearch::ok());
    let agent = ChatAgent::new(model.clone(), Arc::new(MemoryStore::new()), Duration::from_secs(5))
        .with_tools(toolbox(search.clone()))
        .with_max_tool_rounds(2);

    let reply = agent.ask("loop", "keep searching").await.unwrap();

    assert!(reply.content.starts_with("Based on the tools: Search results for 'more'"));
    assert_eq!(search.calls(), 2);
    // Two tool-enabled rounds, then one plain completion
    assert_eq!(model.offered.lock().unwrap().len(), 2);
    assert_eq!(model.recorded().len(), 3);
}

#[tokio::test]
async fn test_tool_errors_are_reported_to_the_model() {
    let model = Arc::new(ToolCallingModel::calling(vec![vec![ToolCall::new(
        "call_1",
        "web_search",
        r#"{"query":"anything"}"#,
    )]]));
    let agent = ChatAgent::new(model, Arc::new(MemoryStore::new()), Duration::from_secs(5))
        .with_tools(toolbox(Arc::new(MockSearch::always_failing())));

    let reply = agent.ask("broken-tool", "search please").await.unwrap();
    assert_eq!(
        reply.content,
        "Based on the tools: Error: Capability error: search backend unavailable"
    );
}
