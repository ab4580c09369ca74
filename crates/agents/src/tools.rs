//! Tools the chat agent offers to the model

use crate::calculator::{extract_figures, format_money, Figures};
use crate::llm::{ToolCall, ToolSpec};
use crate::search::WebSearch;
use crate::specialist::with_deadline;
use crate::{AgentError, Result};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

pub const WEB_SEARCH: &str = "web_search";
pub const CALCULATE_PROFIT: &str = "calculate_profit";

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

#[derive(Debug, Default, Deserialize)]
struct ProfitArgs {
    revenue: Option<f64>,
    cost: Option<f64>,
    /// Free text to pull the figures from when the numbers are not given
    text: Option<String>,
}

/// Web search and profit calculation, callable by name
#[derive(Clone)]
pub struct Toolbox {
    search: Arc<dyn WebSearch>,
    timeout: Duration,
}

impl Toolbox {
    pub fn new(search: Arc<dyn WebSearch>, timeout: Duration) -> Self {
        Self { search, timeout }
    }

    /// Descriptors sent with tool-enabled requests
    pub fn specs(&self) -> Vec<ToolSpec> {
        vec![
            ToolSpec {
                name: WEB_SEARCH.into(),
                description: "Search the web for facts. Returns a short text snippet.".into(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "query": {"type": "string", "description": "What to search for"}
                    },
                    "required": ["query"]
                }),
            },
            ToolSpec {
                name: CALCULATE_PROFIT.into(),
                description: "Calculate profit from revenue and cost.".into(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "revenue": {"type": "number"},
                        "cost": {"type": "number"},
                        "text": {
                            "type": "string",
                            "description": "Text mentioning revenue and cost, used when the numbers are omitted"
                        }
                    }
                }),
            },
        ]
    }

    /// Run one call. Failures come back as text so the model can react to them.
    #[instrument(skip(self, call), fields(tool = %call.function.name))]
    pub async fn invoke(&self, call: &ToolCall) -> String {
        match self.dispatch(call).await {
            Ok(output) => {
                info!("Tool {} answered with {} chars", call.function.name, output.len());
                output
            }
            Err(e) => {
                warn!("Tool {} failed: {}", call.function.name, e);
                format!("Error: {}", e)
            }
        }
    }

    async fn dispatch(&self, call: &ToolCall) -> Result<String> {
        let arguments = if call.function.arguments.trim().is_empty() {
            "{}"
        } else {
            call.function.arguments.as_str()
        };

        match call.function.name.as_str() {
            WEB_SEARCH => {
                let args: SearchArgs = parse_args(WEB_SEARCH, arguments)?;
                with_deadline("web search", self.timeout, self.search.search(&args.query)).await
            }
            CALCULATE_PROFIT => {
                let args: ProfitArgs = parse_args(CALCULATE_PROFIT, arguments)?;
                let figures = match (args.revenue, args.cost, args.text) {
                    (Some(revenue), Some(cost), _) => Figures { revenue, cost },
                    (_, _, Some(text)) => extract_figures(&text)?,
                    _ => {
                        return Err(AgentError::Capability(
                            "calculate_profit needs revenue and cost, or text".into(),
                        ))
                    }
                };
                Ok(format!(
                    "Profit {} (revenue {} - cost {})",
                    format_money(figures.profit()),
                    format_money(figures.revenue),
                    format_money(figures.cost)
                ))
            }
            other => Err(AgentError::Capability(format!("unknown tool: {}", other))),
        }
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(tool: &str, arguments: &str) -> Result<T> {
    serde_json::from_str(arguments)
        .map_err(|e| AgentError::Capability(format!("bad arguments for {}: {}", tool, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offline::CannedSearch;

    fn toolbox() -> Toolbox {
        Toolbox::new(Arc::new(CannedSearch), Duration::from_secs(5))
    }

    #[test]
    fn test_specs_name_both_tools() {
        let names: Vec<String> = toolbox().specs().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec![WEB_SEARCH, CALCULATE_PROFIT]);
    }

    #[tokio::test]
    async fn test_web_search_call() {
        let call = ToolCall::new("1", WEB_SEARCH, r#"{"query":"latest LangChain version"}"#);
        let output = toolbox().invoke(&call).await;
        assert!(output.starts_with("Search results for 'latest LangChain version'"));
    }

    #[tokio::test]
    async fn test_profit_from_numbers() {
        let call = ToolCall::new("2", CALCULATE_PROFIT, r#"{"revenue":500000,"cost":350000}"#);
        assert_eq!(
            toolbox().invoke(&call).await,
            "Profit $150,000 (revenue $500,000 - cost $350,000)"
        );
    }

    #[tokio::test]
    async fn test_profit_from_text() {
        let call = ToolCall::new("3", CALCULATE_PROFIT, r#"{"text":"revenue $500k and cost $350k"}"#);
        assert!(toolbox().invoke(&call).await.starts_with("Profit $150,000"));
    }

    #[tokio::test]
    async fn test_bad_calls_become_error_text() {
        let tools = toolbox();

        let unknown = tools.invoke(&ToolCall::new("4", "rm_rf", "{}")).await;
        assert_eq!(unknown, "Error: Capability error: unknown tool: rm_rf");

        let malformed = tools.invoke(&ToolCall::new("5", WEB_SEARCH, "not json")).await;
        assert!(malformed.starts_with("Error: Capability error: bad arguments for web_search"));

        let empty = tools.invoke(&ToolCall::new("6", CALCULATE_PROFIT, "")).await;
        assert!(empty.contains("needs revenue and cost"));
    }
}
