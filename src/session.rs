//! Per-session conversation contexts
//!
//! Each browser session owns a [`SessionContext`] holding the id of the
//! last upstream response, so follow-up requests continue the same remote
//! conversation. Contexts live only in memory. A request locks its own
//! context for the whole upstream call, which serializes turns within a
//! session while other sessions proceed independently.

use crate::config::ConversationConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Conversation continuity state for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    id: String,
    previous_response_id: Option<String>,
    turns: u64,
}

impl SessionContext {
    /// Create an empty context
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            previous_response_id: None,
            turns: 0,
        }
    }

    /// Session identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Response id to continue from, if any
    pub fn previous_response_id(&self) -> Option<&str> {
        self.previous_response_id.as_deref()
    }

    /// Number of completed turns
    pub fn turns(&self) -> u64 {
        self.turns
    }

    /// Record a successful reply so the next request continues from it
    pub fn record_reply(&mut self, response_id: impl Into<String>) {
        self.previous_response_id = Some(response_id.into());
        self.turns += 1;
    }

    /// Drop the continuation pointer; the next request starts a new thread
    pub fn reset(&mut self) {
        self.previous_response_id = None;
        self.turns = 0;
    }
}

struct SessionEntry {
    context: Arc<Mutex<SessionContext>>,
    last_used: Instant,
}

/// In-memory store of session contexts with idle expiry and a size cap
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    ttl: Duration,
    max_sessions: usize,
}

impl SessionStore {
    /// Create a store
    ///
    /// # Arguments
    ///
    /// * `ttl` - Idle time after which a context is discarded
    /// * `max_sessions` - Maximum number of live contexts
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Create a store from conversation configuration
    pub fn from_config(config: &ConversationConfig) -> Self {
        Self::new(
            Duration::from_secs(config.session_ttl_seconds),
            config.max_sessions,
        )
    }

    /// Get the context for `requested`, creating it when unknown
    ///
    /// Without a requested id a fresh session with a random id is created.
    /// Expired sessions are purged first; when the store is full the least
    /// recently used session is evicted.
    ///
    /// # Returns
    ///
    /// Returns the session id and its shared context
    pub async fn checkout(&self, requested: Option<&str>) -> (String, Arc<Mutex<SessionContext>>) {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        self.purge_expired(&mut sessions, now);

        let id = requested
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        if let Some(entry) = sessions.get_mut(&id) {
            entry.last_used = now;
            return (id, Arc::clone(&entry.context));
        }

        if sessions.len() >= self.max_sessions {
            // sessions checked out by a request in flight are never evicted
            let oldest = sessions
                .iter()
                .filter(|(_, entry)| Arc::strong_count(&entry.context) == 1)
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    sessions.remove(&key);
                    tracing::debug!("Evicted least recently used session {}", key);
                }
                None => tracing::warn!(
                    "All {} sessions are in use, exceeding the session limit",
                    sessions.len()
                ),
            }
        }

        let context = Arc::new(Mutex::new(SessionContext::new(id.clone())));
        sessions.insert(
            id.clone(),
            SessionEntry {
                context: Arc::clone(&context),
                last_used: now,
            },
        );
        tracing::debug!("Created session {}", id);

        (id, context)
    }

    /// Forget a session
    ///
    /// # Returns
    ///
    /// Returns true if the session existed
    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Drop a session that never completed a turn
    ///
    /// Used when the first request of a session fails, so that sessions
    /// whose id never reached a client do not occupy the store. The entry
    /// is kept if it has recorded a reply or if another request holds it,
    /// so the caller must release its lock on the context first.
    ///
    /// # Arguments
    ///
    /// * `id` - Session id returned by [`SessionStore::checkout`]
    /// * `context` - The caller's handle from the same checkout
    ///
    /// # Returns
    ///
    /// Returns true if the session was removed
    pub async fn discard_unused(&self, id: &str, context: &Arc<Mutex<SessionContext>>) -> bool {
        let mut sessions = self.sessions.write().await;
        let unused = match sessions.get(id) {
            // the store and the caller are the only holders
            Some(entry) => {
                Arc::ptr_eq(&entry.context, context)
                    && Arc::strong_count(context) == 2
                    && entry
                        .context
                        .try_lock()
                        .map(|ctx| ctx.turns() == 0 && ctx.previous_response_id().is_none())
                        .unwrap_or(false)
            }
            None => false,
        };
        if unused {
            sessions.remove(id);
            tracing::debug!("Discarded unused session {}", id);
        }
        unused
    }

    /// Number of live sessions, including ones not yet purged
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the store holds no sessions
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    fn purge_expired(&self, sessions: &mut HashMap<String, SessionEntry>, now: Instant) {
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_used) < self.ttl);
        let purged = before - sessions.len();
        if purged > 0 {
            tracing::debug!("Purged {} expired sessions", purged);
        }
    }
}
