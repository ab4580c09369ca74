//! Session persistence seam and per-session serialization

use crate::Result;
use agentflow_core::ConversationState;
use agentflow_db::Repository;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, RwLock};
use tracing::instrument;

/// Keyed storage for conversation state
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Latest state for the session, or `None` if it was never stored
    async fn get(&self, session_id: &str) -> Result<Option<ConversationState>>;

    /// Replace the stored state for the session
    async fn put(&self, session_id: &str, state: &ConversationState) -> Result<()>;
}

/// Durable backend on SurrealDB
#[async_trait]
impl SessionStore for Repository {
    async fn get(&self, session_id: &str) -> Result<Option<ConversationState>> {
        Ok(self.get_state(session_id).await?)
    }

    async fn put(&self, session_id: &str, state: &ConversationState) -> Result<()> {
        Ok(self.put_state(session_id, state).await?)
    }
}

/// In-process backend, for tests and throwaway runs
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    sessions: Arc<RwLock<HashMap<String, ConversationState>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    #[instrument(skip(self))]
    async fn get(&self, session_id: &str) -> Result<Option<ConversationState>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    #[instrument(skip(self, state))]
    async fn put(&self, session_id: &str, state: &ConversationState) -> Result<()> {
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), state.clone());
        Ok(())
    }
}

/// One async lock per session id.
///
/// Holding the guard for a whole run keeps same-session runs from
/// interleaving their read-modify-write cycles; other sessions proceed.
/// An entry lives only while some caller holds or waits for it.
#[derive(Debug, Default, Clone)]
pub struct SessionLocks {
    locks: Arc<Mutex<LockMap>>,
}

type LockMap = HashMap<String, Arc<AsyncMutex<()>>>;

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `session_id`
    pub async fn acquire(&self, session_id: &str) -> SessionGuard {
        let lock = {
            let mut locks = lock_map(&self.locks);
            locks
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        SessionGuard {
            guard: Some(lock.lock_owned().await),
            session_id: session_id.to_string(),
            locks: self.locks.clone(),
        }
    }

    /// Sessions currently locked or waited on
    pub fn len(&self) -> usize {
        lock_map(&self.locks).len()
    }

    pub fn is_empty(&self) -> bool {
        lock_map(&self.locks).is_empty()
    }
}

fn lock_map(locks: &Mutex<LockMap>) -> MutexGuard<'_, LockMap> {
    locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Exclusive access to one session; releasing the last one drops the entry
pub struct SessionGuard {
    guard: Option<OwnedMutexGuard<()>>,
    session_id: String,
    locks: Arc<Mutex<LockMap>>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.guard.take();

        let mut locks = lock_map(&self.locks);
        let unused = locks
            .get(&self.session_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1);
        if unused {
            locks.remove(&self.session_id);
        }
    }
}
