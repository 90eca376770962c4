use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Utc};

use crate::utils;

/// Pending logins kept before the oldest one is evicted.
pub const MAX_PENDING_LOGINS: usize = 1024;

/// A login that was started but whose callback has not arrived yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLogin {
    pub session: String,
    pub created_at: DateTime<Utc>,
}

/// Nonces handed out by `/login`, keyed by the nonce itself.
///
/// Several logins may be in flight at once; each nonce is single use and
/// expires after `ttl`. At most `limit` nonces are held, the oldest one gives
/// way to a new login.
pub struct PendingLogins {
    pending: Mutex<HashMap<String, PendingLogin>>,
    ttl: chrono::Duration,
    limit: usize,
}

impl PendingLogins {
    pub fn new(ttl: Duration) -> Self {
        Self::with_limit(ttl, MAX_PENDING_LOGINS)
    }

    pub fn with_limit(ttl: Duration, limit: usize) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            limit: limit.max(1),
        }
    }

    /// Creates a fresh nonce for `session` and records it as pending.
    pub fn register(&self, session: &str) -> String {
        let nonce = utils::generate_nonce();
        let entry = PendingLogin {
            session: session.to_string(),
            created_at: Utc::now(),
        };

        let mut pending = self.lock();
        while pending.len() >= self.limit {
            let Some(oldest) = pending
                .iter()
                .min_by_key(|(_, entry)| entry.created_at)
                .map(|(nonce, _)| nonce.clone())
            else {
                break;
            };
            pending.remove(&oldest);
            tracing::debug!("pending login limit reached, oldest login evicted");
        }
        pending.insert(nonce.clone(), entry);
        nonce
    }

    /// Removes `nonce` and returns its login if it was pending and not expired.
    pub fn consume(&self, nonce: &str) -> Option<PendingLogin> {
        let entry = self.lock().remove(nonce)?;
        if Utc::now() - entry.created_at > self.ttl {
            return None;
        }
        Some(entry)
    }

    /// Drops every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut pending = self.lock();
        let before = pending.len();
        pending.retain(|_, entry| now - entry.created_at <= self.ttl);
        before - pending.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, PendingLogin>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
