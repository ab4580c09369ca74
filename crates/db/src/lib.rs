//! Database layer for AgentFlow
//!
//! Provides SurrealDB-backed session persistence with schema management.

pub mod error;
pub mod repository;
pub mod schema;

pub use error::{DbError, Result};
pub use repository::{DbStats, Repository, SessionSummary, StoredSession};

#[cfg(feature = "rocksdb")]
use std::path::Path;
use surrealdb::engine::local::{Db, Mem};
use surrealdb::Surreal;

/// Database connection type
pub type DbConnection = Surreal<Db>;

/// Initialize database with RocksDB (persistent)
#[cfg(feature = "rocksdb")]
pub async fn init_persistent(path: impl AsRef<Path>) -> Result<DbConnection> {
    use surrealdb::engine::local::RocksDb;

    let db = Surreal::new::<RocksDb>(path.as_ref())
        .await
        .map_err(|e| DbError::Connection(format!("{}: {}", path.as_ref().display(), e)))?;
    setup_database(&db).await?;
    Ok(db)
}

/// Initialize database in-memory (for testing)
pub async fn init_memory() -> Result<DbConnection> {
    let db = Surreal::new::<Mem>(()).await?;
    setup_database(&db).await?;
    Ok(db)
}

/// Setup database namespace, database, and schema
async fn setup_database(db: &DbConnection) -> Result<()> {
    db.use_ns("agentflow").use_db("sessions").await?;
    schema::initialize_schema(db).await?;
    Ok(())
}
