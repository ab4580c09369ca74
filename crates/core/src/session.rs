//! Session records - a conversation persisted under a caller-chosen id

use crate::{ConversationState, CoreError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The latest state stored for a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub state: ConversationState,
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(session_id: impl Into<String>, state: ConversationState) -> Self {
        Self {
            session_id: session_id.into(),
            state,
            updated_at: Utc::now(),
        }
    }

    /// Check that a session id is usable as a key
    pub fn validate_id(session_id: &str) -> Result<()> {
        if session_id.trim().is_empty() {
            return Err(CoreError::Validation("session id must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Message;

    #[test]
    fn test_validate_id() {
        assert!(SessionRecord::validate_id("multi-agent-session").is_ok());
        assert!(SessionRecord::validate_id("   ").is_err());
        assert!(SessionRecord::validate_id("").is_err());
    }

    #[test]
    fn test_record_roundtrip_keeps_order() {
        let state = ConversationState::with_messages(vec![
            Message::user("one"),
            Message::assistant("two"),
        ]);
        let record = SessionRecord::new("abc123", state);
        let json = serde_json::to_string(&record).unwrap();
        let back: SessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.session_id, "abc123");
        assert_eq!(back.state, record.state);
    }
}
