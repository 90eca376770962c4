use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::Mutex as AsyncMutex;

use crate::types::TokenState;

/// Key of the session used by the single-user HTTP surface.
pub const DEFAULT_SESSION: &str = "default";

/// The per-session critical section. Holding its lock is the only way to read
/// or replace a session's tokens.
pub type SessionSlot = Arc<AsyncMutex<Option<TokenState>>>;

/// In-memory token storage, one slot per session key.
///
/// A slot is created empty on first access and never removed; logging out
/// empties it. Nothing is persisted.
#[derive(Default)]
pub struct TokenStore {
    sessions: Mutex<HashMap<String, SessionSlot>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot for `session`, creating an empty one if needed.
    pub fn slot(&self, session: &str) -> SessionSlot {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(sessions.entry(session.to_string()).or_default())
    }

    /// Snapshot of the session's current tokens.
    pub async fn get(&self, session: &str) -> Option<TokenState> {
        self.slot(session).lock().await.clone()
    }

    pub async fn put(&self, session: &str, state: TokenState) {
        *self.slot(session).lock().await = Some(state);
    }

    /// Forgets the session's tokens, returning what was stored.
    pub async fn clear(&self, session: &str) -> Option<TokenState> {
        self.slot(session).lock().await.take()
    }

    /// Whether the session holds tokens, without waiting for its lock.
    ///
    /// A slot that is locked right now is in the middle of a call or a
    /// refresh and counts as authenticated.
    pub fn is_authenticated(&self, session: &str) -> bool {
        match self.slot(session).try_lock() {
            Ok(tokens) => tokens.is_some(),
            Err(_) => true,
        }
    }
}
