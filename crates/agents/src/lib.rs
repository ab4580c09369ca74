//! AI Agents for AgentFlow
//! 
//! This crate contains the workflow and the agents it routes between:
//! - Researcher: looks up the requested topic with web search
//! - Calculator: computes profit from figures in the request
//! - Summarizer: condenses the conversation with a language model
//! - Workflow: the supervisor loop over a session store
//! - ChatAgent: multi-turn chat over the same sessions, optionally with tools

pub mod calculator;
pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod offline;
pub mod researcher;
pub mod search;
pub mod specialist;
pub mod store;
pub mod summarizer;
pub mod tools;
pub mod workflow;

pub use calculator::Calculator;
pub use chat::ChatAgent;
pub use config::{ModelConfig, SearchConfig, WorkflowConfig};
pub use error::{AgentError, Result};
pub use llm::{ChatClient, ChatMessage, ChatModel, FunctionCall, ModelTurn, ToolCall, ToolSpec};
pub use offline::{CannedSearch, TemplateModel};
pub use researcher::Researcher;
pub use search::{DuckDuckGoClient, WebSearch};
pub use specialist::Specialist;
pub use store::{MemoryStore, SessionLocks, SessionStore};
pub use summarizer::Summarizer;
pub use tools::Toolbox;
pub use workflow::{StepEvent, Workflow, WorkflowRun};
