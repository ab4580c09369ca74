//! Deterministic stand-ins for the network capabilities, for demos without
//! a model endpoint or internet access.

use crate::llm::{ChatMessage, ChatModel};
use crate::search::WebSearch;
use crate::Result;
use async_trait::async_trait;

/// Search backend that answers every query with canned text
#[derive(Debug, Clone, Default)]
pub struct CannedSearch;

#[async_trait]
impl WebSearch for CannedSearch {
    async fn search(&self, query: &str) -> Result<String> {
        Ok(format!(
            "Search results for '{}': Agentic AI systems use tools autonomously, \
             reason step by step and keep state across turns.",
            query
        ))
    }
}

/// Model that summarizes by quoting the latest user request.
///
/// A transcript (`role: content` lines) is searched for its last `user:` line.
#[derive(Debug, Clone, Default)]
pub struct TemplateModel;

#[async_trait]
impl ChatModel for TemplateModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let topic = messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .and_then(|m| latest_request(&m.content))
            .unwrap_or_else(|| "the conversation".to_string());
        Ok(format!("Summary for {}: autonomous, tool-using AI systems.", topic))
    }

    fn model_id(&self) -> &str {
        "template"
    }
}

fn latest_request(content: &str) -> Option<String> {
    let line = content
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix("user: "))
        .or_else(|| content.lines().last())?;
    Some(line.trim().to_string())
}
