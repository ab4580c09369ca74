//! Supervisor workflow - routes the conversation through the specialists
//!
//! The loop alternates between the supervisor (a [`Router`] decision) and at
//! most one specialist invocation. Every specialist message is appended and
//! persisted before control returns to the supervisor, and the run ends
//! only when the router reports `Done` or the step ceiling is hit.

use crate::calculator::Calculator;
use crate::config::WorkflowConfig;
use crate::llm::ChatModel;
use crate::researcher::Researcher;
use crate::search::WebSearch;
use crate::specialist::Specialist;
use crate::store::{SessionLocks, SessionStore};
use crate::summarizer::Summarizer;
use crate::{AgentError, Result};
use agentflow_core::{ConversationState, Message, Router, RoutingDecision, SessionRecord, Task};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};

/// One specialist step, as it happened
#[derive(Debug, Clone)]
pub struct StepEvent {
    /// 1-based step number within the run
    pub step: usize,
    pub task: Task,
    pub message: Message,
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct WorkflowRun {
    pub session_id: String,
    /// Full session state after the run
    pub state: ConversationState,
    /// Specialists invoked during this run, in order
    pub dispatched: Vec<Task>,
    /// Input messages recorded at the start of the run
    pub appended: usize,
}

impl WorkflowRun {
    /// Messages the specialists appended during this run
    pub fn produced(&self) -> &[Message] {
        let messages = self.state.messages();
        &messages[messages.len() - self.dispatched.len()..]
    }

    /// True if no specialist ran (new input may still have been recorded)
    pub fn is_noop(&self) -> bool {
        self.dispatched.is_empty()
    }
}

pub struct Workflow {
    router: Router,
    specialists: HashMap<Task, Arc<dyn Specialist>>,
    store: Arc<dyn SessionStore>,
    locks: SessionLocks,
    max_steps: usize,
}

impl Workflow {
    /// Create a workflow; every planned task needs a specialist
    pub fn new(
        config: WorkflowConfig,
        store: Arc<dyn SessionStore>,
        specialists: Vec<Arc<dyn Specialist>>,
    ) -> Result<Self> {
        let specialists: HashMap<Task, Arc<dyn Specialist>> = specialists
            .into_iter()
            .map(|s| (s.task(), s))
            .collect();

        if let Some(missing) = config.plan.tasks().iter().find(|t| !specialists.contains_key(*t)) {
            return Err(AgentError::MissingSpecialist(*missing));
        }

        Ok(Self {
            router: Router::new(config.plan).with_scope(config.scope),
            specialists,
            store,
            locks: SessionLocks::new(),
            max_steps: config.max_steps,
        })
    }

    /// Workflow with the researcher, calculator and summarizer wired to the
    /// given capabilities
    pub fn with_capabilities(
        config: WorkflowConfig,
        store: Arc<dyn SessionStore>,
        search: Arc<dyn WebSearch>,
        model: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        let timeout = config.capability_timeout;
        let specialists: Vec<Arc<dyn Specialist>> = vec![
            Arc::new(Researcher::new(search, timeout)),
            Arc::new(Calculator::new()),
            Arc::new(Summarizer::new(model, timeout)),
        ];
        Self::new(config, store, specialists)
    }

    /// Builder: share session locks with other components on the same store
    pub fn with_locks(mut self, locks: SessionLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn locks(&self) -> &SessionLocks {
        &self.locks
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Run the session until the router reports done.
    ///
    /// `input` is appended to the stored state (or seeds it on first use).
    /// A finished session with no new input is returned unchanged.
    pub async fn run(&self, session_id: &str, input: Vec<Message>) -> Result<WorkflowRun> {
        self.execute(session_id, input, None).await
    }

    /// Like [`Workflow::run`], reporting each specialist step on `events`
    pub async fn run_streaming(
        &self,
        session_id: &str,
        input: Vec<Message>,
        events: UnboundedSender<StepEvent>,
    ) -> Result<WorkflowRun> {
        self.execute(session_id, input, Some(&events)).await
    }

    #[instrument(skip(self, input, events), fields(input = input.len()))]
    async fn execute(
        &self,
        session_id: &str,
        input: Vec<Message>,
        events: Option<&UnboundedSender<StepEvent>>,
    ) -> Result<WorkflowRun> {
        SessionRecord::validate_id(session_id)
            .map_err(|_| AgentError::InvalidSession(session_id.to_string()))?;

        let _guard = self.locks.acquire(session_id).await;

        let mut state = self.store.get(session_id).await?.unwrap_or_default();
        debug!("Loaded {} messages for session {}", state.len(), session_id);

        if state.is_empty() && input.is_empty() {
            return Err(AgentError::EmptyConversation(session_id.to_string()));
        }

        let appended = input.len();
        if appended > 0 {
            for message in input {
                state.push(message);
            }
            self.store.put(session_id, &state).await?;
        }

        let mut dispatched = Vec::new();

        loop {
            let task = match self.router.decide(&state) {
                RoutingDecision::Done => break,
                RoutingDecision::Dispatch(task) => task,
            };

            if dispatched.len() >= self.max_steps {
                warn!(
                    "Session {} still routing to {} after {} steps",
                    session_id,
                    task,
                    dispatched.len()
                );
                return Err(AgentError::DidNotConverge {
                    session_id: session_id.to_string(),
                    steps: dispatched.len(),
                });
            }

            let specialist = self
                .specialists
                .get(&task)
                .ok_or(AgentError::MissingSpecialist(task))?;

            info!("Session {} step {}: dispatching {}", session_id, dispatched.len() + 1, task);
            let message = specialist.run(&state).await;

            state.push(message.clone());
            self.store.put(session_id, &state).await?;
            dispatched.push(task);

            if let Some(events) = events {
                // A dropped receiver only means nobody is watching
                let _ = events.send(StepEvent {
                    step: dispatched.len(),
                    task,
                    message,
                });
            }
        }

        info!(
            "Session {} finished after {} steps ({} messages)",
            session_id,
            dispatched.len(),
            state.len()
        );

        Ok(WorkflowRun {
            session_id: session_id.to_string(),
            state,
            dispatched,
            appended,
        })
    }
}
