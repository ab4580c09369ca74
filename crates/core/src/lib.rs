//! Core domain types for AgentFlow
//! 
//! This crate defines the fundamental data structures used throughout
//! the workflow: Messages, Tasks, the ConversationState they accumulate in,
//! and the Router that decides which specialist runs next.

pub mod message;
pub mod task;
pub mod state;
pub mod routing;
pub mod session;
pub mod error;

pub use message::{Message, Role};
pub use task::{Completion, Plan, Task, TaskStatus};
pub use state::ConversationState;
pub use routing::{Router, RoutingDecision, RoutingScope};
pub use session::SessionRecord;
pub use error::{CoreError, Result};
