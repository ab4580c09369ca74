//! SurrealDB schema definitions

use crate::{DbConnection, DbError, Result};
use tracing::info;

/// Table holding one record per session
pub const SESSION_TABLE: &str = "session";

/// Initialize the database schema
pub async fn initialize_schema(db: &DbConnection) -> Result<()> {
    info!("Initializing database schema...");
    
    db.query(SCHEMA_DEFINITION)
        .await?
        .check()
        .map_err(|e| DbError::SchemaInit(e.to_string()))?;
    
    info!("Schema initialized successfully");
    Ok(())
}

// The conversation is stored as serialized JSON so message layout can evolve
// without schema migrations.
const SCHEMA_DEFINITION: &str = r#"
-- ============================================
-- TABLES
-- ============================================

DEFINE TABLE IF NOT EXISTS session SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS session_id ON session TYPE string;
DEFINE FIELD IF NOT EXISTS state ON session TYPE string;
DEFINE FIELD IF NOT EXISTS message_count ON session TYPE int DEFAULT 0;
DEFINE FIELD IF NOT EXISTS created_at ON session TYPE datetime DEFAULT time::now();
DEFINE FIELD IF NOT EXISTS updated_at ON session TYPE datetime DEFAULT time::now();

-- ============================================
-- INDEXES
-- ============================================

DEFINE INDEX IF NOT EXISTS idx_session_id ON session FIELDS session_id UNIQUE;
DEFINE INDEX IF NOT EXISTS idx_session_updated ON session FIELDS updated_at;
"#;
