//! Repository pattern for session persistence

use crate::schema::SESSION_TABLE;
use crate::{DbConnection, DbError, Result};
use agentflow_core::ConversationState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use tracing::{debug, instrument};

/// Repository for all database operations
#[derive(Clone)]
pub struct Repository {
    db: DbConnection,
}

impl Repository {
    /// Create a new repository
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn record_id(session_id: &str) -> RecordId {
        RecordId::from_table_key(SESSION_TABLE, session_id)
    }

    // ==========================================
    // SESSION OPERATIONS
    // ==========================================

    /// Load the stored session, if any
    #[instrument(skip(self))]
    pub async fn get_session(&self, session_id: &str) -> Result<Option<StoredSession>> {
        let rows: Vec<SessionRow> = self.db
            .query(r#"
                SELECT
                    session_id,
                    state,
                    message_count,
                    <string> created_at AS created_at,
                    <string> updated_at AS updated_at
                FROM $rid
            "#)
            .bind(("rid", Self::record_id(session_id)))
            .await?
            .take(0)?;

        rows.into_iter().next().map(StoredSession::try_from).transpose()
    }

    /// Load only the conversation state
    pub async fn get_state(&self, session_id: &str) -> Result<Option<ConversationState>> {
        Ok(self.get_session(session_id).await?.map(|s| s.state))
    }

    /// Create or overwrite the session's state in a single statement
    #[instrument(skip(self, state), fields(messages = state.len()))]
    pub async fn put_state(&self, session_id: &str, state: &ConversationState) -> Result<()> {
        let payload = serde_json::to_string(state)?;

        self.db
            .query(r#"
                UPSERT $rid SET
                    session_id = $session_id,
                    state = $state,
                    message_count = $message_count,
                    updated_at = time::now()
            "#)
            .bind(("rid", Self::record_id(session_id)))
            .bind(("session_id", session_id.to_string()))
            .bind(("state", payload))
            .bind(("message_count", state.len() as i64))
            .await?
            .check()
            .map_err(|e| DbError::QueryFailed(format!("put_state {}: {}", session_id, e)))?;

        debug!("Stored {} messages for session {}", state.len(), session_id);
        Ok(())
    }

    /// Delete a session; errors if it does not exist
    #[instrument(skip(self))]
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        let removed: Option<DeletedRow> = self.db
            .delete((SESSION_TABLE, session_id))
            .await?;

        match removed {
            Some(row) => {
                debug!("Deleted session {}", row.session_id);
                Ok(())
            }
            None => Err(DbError::NotFound(SESSION_TABLE.into(), session_id.into())),
        }
    }

    /// List sessions, most recently updated first
    #[instrument(skip(self))]
    pub async fn list_sessions(&self, limit: usize) -> Result<Vec<SessionSummary>> {
        let rows: Vec<SummaryRow> = self.db
            .query(r#"
                SELECT
                    session_id,
                    message_count,
                    <string> created_at AS created_at,
                    <string> updated_at AS updated_at
                FROM session
            "#)
            .await?
            .take(0)?;

        let mut sessions: Vec<SessionSummary> = rows.into_iter().map(SessionSummary::from).collect();

        // Sort and limit in Rust; ordering by the cast string is not reliable.
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sessions.truncate(limit);

        Ok(sessions)
    }

    // ==========================================
    // STATS
    // ==========================================

    /// Get database statistics
    #[instrument(skip(self))]
    pub async fn get_stats(&self) -> Result<DbStats> {
        let stats: Vec<DbStats> = self.db
            .query(r#"
                SELECT
                    count() AS session_count,
                    math::sum(message_count) AS message_count
                FROM session
                GROUP ALL
            "#)
            .await?
            .take(0)?;

        // GROUP ALL over an empty table yields no rows
        Ok(stats.into_iter().next().unwrap_or_default())
    }
}

// ==========================================
// ROW TYPES
// ==========================================

#[derive(Debug, Deserialize)]
struct SessionRow {
    session_id: String,
    state: String,
    #[serde(default)]
    message_count: i64,
    created_at: Option<String>,
    updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeletedRow {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct SummaryRow {
    session_id: String,
    #[serde(default)]
    message_count: i64,
    created_at: Option<String>,
    updated_at: Option<String>,
}

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .map(|v| v.trim_matches(|c| c == '\'' || c == '"'))
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

// ==========================================
// RESULT TYPES
// ==========================================

/// A session as persisted, with bookkeeping fields
#[derive(Debug, Clone)]
pub struct StoredSession {
    pub session_id: String,
    pub state: ConversationState,
    pub message_count: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<SessionRow> for StoredSession {
    type Error = DbError;

    fn try_from(row: SessionRow) -> Result<Self> {
        let state: ConversationState = serde_json::from_str(&row.state)?;
        Ok(Self {
            created_at: parse_timestamp(row.created_at.as_deref()),
            updated_at: parse_timestamp(row.updated_at.as_deref()),
            session_id: row.session_id,
            message_count: row.message_count,
            state,
        })
    }
}

/// Listing entry without the conversation body
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub message_count: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<SummaryRow> for SessionSummary {
    fn from(row: SummaryRow) -> Self {
        Self {
            created_at: parse_timestamp(row.created_at.as_deref()),
            updated_at: parse_timestamp(row.updated_at.as_deref()),
            session_id: row.session_id,
            message_count: row.message_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DbStats {
    #[serde(default)]
    pub session_count: i64,
    #[serde(default)]
    pub message_count: i64,
}
