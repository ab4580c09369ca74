//! Agent error types

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Domain error: {0}")]
    Core(#[from] agentflow_core::CoreError),

    #[error("Database error: {0}")]
    Database(#[from] agentflow_db::DbError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Capability error: {0}")]
    Capability(String),

    #[error("{0} timed out after {1:?}")]
    Timeout(String, Duration),

    #[error("Session {0} has no messages to work on")]
    EmptyConversation(String),

    #[error("Invalid session id: {0:?}")]
    InvalidSession(String),

    #[error("No specialist registered for task: {0}")]
    MissingSpecialist(agentflow_core::Task),

    #[error("Session {session_id} did not converge after {steps} steps")]
    DidNotConverge { session_id: String, steps: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AgentError>;
