//! Web search capability backed by the DuckDuckGo Instant Answer API

use crate::config::SearchConfig;
use crate::{AgentError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

const MAX_RELATED_TOPICS: usize = 5;

/// Free-text query in, free-text snippet out
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<String>;
}

/// Client for the DuckDuckGo Instant Answer API
#[derive(Clone)]
pub struct DuckDuckGoClient {
    client: Client,
    base_url: String,
}

impl DuckDuckGoClient {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url,
        }
    }

    /// Client configured from the environment
    pub fn from_env() -> Self {
        Self::new(SearchConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl WebSearch for DuckDuckGoClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<String> {
        let url = format!("{}/", self.base_url);

        let response: InstantAnswer = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let snippet = response.snippet();
        debug!("Search returned {} chars", snippet.len());

        if snippet.is_empty() {
            return Err(AgentError::Capability(format!("no search results for '{}'", query)));
        }
        Ok(snippet)
    }
}

// ==========================================
// RESPONSE TYPES
// ==========================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    abstract_text: String,
    #[serde(default)]
    answer: serde_json::Value,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RelatedTopic {
    #[serde(default)]
    text: Option<String>,
    /// Grouped topics nest one level
    #[serde(default)]
    topics: Vec<RelatedTopic>,
}

impl InstantAnswer {
    /// Abstract if present, else the direct answer, else related topic texts
    fn snippet(&self) -> String {
        let abstract_text = self.abstract_text.trim();
        if !abstract_text.is_empty() {
            return abstract_text.to_string();
        }

        if let Some(answer) = self.answer.as_str().map(str::trim).filter(|a| !a.is_empty()) {
            return answer.to_string();
        }

        self.related_topics
            .iter()
            .flat_map(|topic| std::iter::once(topic).chain(topic.topics.iter()))
            .filter_map(|topic| topic.text.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .take(MAX_RELATED_TOPICS)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = DuckDuckGoClient::new(SearchConfig::default());
        assert_eq!(client.base_url(), "https://api.duckduckgo.com");
    }

    #[test]
    fn test_snippet_prefers_abstract() {
        let answer: InstantAnswer = serde_json::from_str(
            r#"{"AbstractText":"Rust is a systems language.","Answer":"","RelatedTopics":[{"Text":"Cargo"}]}"#,
        )
        .unwrap();
        assert_eq!(answer.snippet(), "Rust is a systems language.");
    }

    #[test]
    fn test_snippet_falls_back_to_related_topics() {
        let answer: InstantAnswer = serde_json::from_str(
            r#"{
                "AbstractText": "",
                "Answer": "",
                "RelatedTopics": [
                    {"Text": "LangGraph - a library for stateful agents", "FirstURL": "https://duckduckgo.com/LangGraph"},
                    {"Name": "See also", "Topics": [{"Text": "LangChain"}]}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(answer.snippet(), "LangGraph - a library for stateful agents | LangChain");
    }

    #[test]
    fn test_snippet_empty() {
        let answer: InstantAnswer = serde_json::from_str(r#"{"AbstractText":"","RelatedTopics":[]}"#).unwrap();
        assert!(answer.snippet().is_empty());
    }
}
