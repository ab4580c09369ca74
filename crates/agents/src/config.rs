//! Configuration for the workflow and its external services.
//!
//! Every knob has a typed default and can be overridden from the environment.

use crate::{AgentError, Result};
use agentflow_core::{Plan, RoutingScope};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_MODEL_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TEMPERATURE: f32 = 0.0;
const DEFAULT_SEARCH_URL: &str = "https://api.duckduckgo.com";
const DEFAULT_MAX_STEPS: usize = 12;
const DEFAULT_CAPABILITY_TIMEOUT_SECS: u64 = 30;

pub(crate) fn env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| AgentError::Config(format!("{}={} is not valid", key, value))),
        _ => Ok(None),
    }
}

/// Settings for the supervisor loop
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Tasks in the order the router works through them
    pub plan: Plan,
    /// Which completions count toward the plan
    pub scope: RoutingScope,
    /// Specialist steps allowed in one run before giving up
    pub max_steps: usize,
    /// Ceiling for each external capability call
    pub capability_timeout: Duration,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            plan: Plan::default(),
            scope: RoutingScope::default(),
            max_steps: DEFAULT_MAX_STEPS,
            capability_timeout: Duration::from_secs(DEFAULT_CAPABILITY_TIMEOUT_SECS),
        }
    }
}

impl WorkflowConfig {
    /// Read `WORKFLOW_PLAN`, `WORKFLOW_ROUTING_SCOPE`, `WORKFLOW_MAX_STEPS`
    /// and `CAPABILITY_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(plan) = std::env::var("WORKFLOW_PLAN") {
            if !plan.trim().is_empty() {
                config.plan = Plan::parse(&plan)?;
            }
        }
        if let Some(scope) = env_parse::<RoutingScope>("WORKFLOW_ROUTING_SCOPE")? {
            config.scope = scope;
        }
        if let Some(max_steps) = env_parse::<usize>("WORKFLOW_MAX_STEPS")? {
            config = config.with_max_steps(max_steps);
        }
        if let Some(secs) = env_parse::<u64>("CAPABILITY_TIMEOUT_SECS")? {
            config.capability_timeout = Duration::from_secs(secs.max(1));
        }

        Ok(config)
    }

    /// Builder: set plan
    pub fn with_plan(mut self, plan: Plan) -> Self {
        self.plan = plan;
        self
    }

    /// Builder: set routing scope
    pub fn with_scope(mut self, scope: RoutingScope) -> Self {
        self.scope = scope;
        self
    }

    /// Builder: set the step ceiling (at least one step)
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Builder: set the per-call timeout
    pub fn with_capability_timeout(mut self, timeout: Duration) -> Self {
        self.capability_timeout = timeout;
        self
    }
}

/// Settings for the OpenAI-compatible completion endpoint
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MODEL_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl ModelConfig {
    /// Read `OPENAI_API_BASE`, `OPENAI_API_KEY`, `OPENAI_MODEL` and `MODEL_TEMPERATURE`
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: env_or_default("OPENAI_API_BASE", DEFAULT_MODEL_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            model: env_or_default("OPENAI_MODEL", DEFAULT_MODEL),
            temperature: env_parse::<f32>("MODEL_TEMPERATURE")?.unwrap_or(DEFAULT_TEMPERATURE),
        })
    }
}

/// Settings for the web search backend
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub base_url: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_SEARCH_URL.to_string() }
    }
}

impl SearchConfig {
    /// Read `SEARCH_URL`
    pub fn from_env() -> Self {
        Self {
            base_url: env_or_default("SEARCH_URL", DEFAULT_SEARCH_URL)
                .trim_end_matches('/')
                .to_string(),
        }
    }
}
