//! Researcher - looks up the requested topic with web search

use crate::search::WebSearch;
use crate::specialist::{failure, with_deadline, Specialist};
use agentflow_core::{ConversationState, Message, Task};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Characters of the search snippet kept in the message
const SNIPPET_CHARS: usize = 300;

pub struct Researcher {
    search: Arc<dyn WebSearch>,
    timeout: Duration,
}

impl Researcher {
    pub fn new(search: Arc<dyn WebSearch>, timeout: Duration) -> Self {
        Self { search, timeout }
    }
}

#[async_trait]
impl Specialist for Researcher {
    fn task(&self) -> Task {
        Task::Research
    }

    #[instrument(skip(self, state))]
    async fn run(&self, state: &ConversationState) -> Message {
        let request = state.latest_request().unwrap_or_default();
        let topic = research_topic(request);
        let lower = topic.to_ascii_lowercase();
        let query = if ["what ", "who ", "how ", "why ", "when ", "where "]
            .iter()
            .any(|w| lower.starts_with(w))
        {
            topic.clone()
        } else {
            format!("What is {}", topic)
        };
        info!("Researching: {}", query);

        match with_deadline("web search", self.timeout, self.search.search(&query)).await {
            Ok(result) => {
                let snippet: String = result.chars().take(SNIPPET_CHARS).collect();
                Message::task_done(
                    Task::Research,
                    format!("Research results for {}: {}...", topic, snippet),
                )
            }
            Err(e) => {
                warn!("Research failed: {}", e);
                failure(Task::Research, &e)
            }
        }
    }
}

/// Subject of a request like "Research X, calculate ..., then summarize."
///
/// Takes the clause after a leading "research" (or "look up", "search for")
/// up to the first comma, semicolon, sentence end or " then "/" and ".
/// A verb later in the request does not count; without a leading verb the
/// whole first clause is the topic.
pub fn research_topic(request: &str) -> String {
    let request = request.trim();
    let lower = request.to_ascii_lowercase();

    let start = ["research ", "look up ", "search for ", "search "]
        .iter()
        .find(|verb| lower.starts_with(*verb))
        .map_or(0, |verb| verb.len());
    let rest = &request[start..];
    let rest_lower = &lower[start..];

    let end = [",", ";", ". ", "? ", " then ", " and "]
        .iter()
        .filter_map(|stop| rest_lower.find(stop))
        .min()
        .unwrap_or(rest.len());

    let topic = rest[..end].trim().trim_end_matches(['.', '?', '!']).trim();
    if topic.is_empty() {
        request.to_string()
    } else {
        topic.to_string()
    }
}
