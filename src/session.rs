//! In-memory session store
//!
//! Volatile, bounded and idle-expiring. Lookups never create sessions; the
//! caller decides when a fresh one starts.

use crate::state_machine::{ChatId, Session};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// User identifier assigned by the transport
pub type UserId = i64;

/// One user's form within one chat. In a group every member fills in their
/// own form; replies still go to the chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub chat_id: ChatId,
    pub user_id: UserId,
}

impl SessionKey {
    pub fn new(chat_id: ChatId, user_id: UserId) -> Self {
        Self { chat_id, user_id }
    }
}

struct Entry {
    session: Session,
    last_access: Instant,
}

/// Per-chat session storage
pub struct SessionStore {
    entries: Mutex<HashMap<SessionKey, Entry>>,
    ttl: Duration,
    capacity: usize,
}

impl SessionStore {
    /// `capacity` is clamped to at least one session
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Current session for `key`, or `None` if absent or expired
    pub fn get(&self, key: SessionKey) -> Option<Session> {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        if !self.take_live(&mut entries, key, now) {
            return None;
        }
        let entry = entries.get_mut(&key)?;
        entry.last_access = now;
        Some(entry.session.clone())
    }

    /// Insert or replace the session for `key`.
    ///
    /// Inserting a new chat into a full store evicts the least recently
    /// used session first.
    pub fn put(&self, key: SessionKey, session: Session) {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(id, _)| *id);
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
                tracing::info!(
                    chat_id = oldest.chat_id,
                    user_id = oldest.user_id,
                    "Evicted least recently used session"
                );
            }
        }
        entries.insert(
            key,
            Entry {
                session,
                last_access: now,
            },
        );
    }

    /// Apply `mutator` to an existing session.
    ///
    /// Returns false, without calling `mutator`, when there is no live
    /// session for `key`.
    #[allow(dead_code)] // Used in tests
    pub fn update<F>(&self, key: SessionKey, mutator: F) -> bool
    where
        F: FnOnce(&mut Session),
    {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        if !self.take_live(&mut entries, key, now) {
            return false;
        }
        match entries.get_mut(&key) {
            Some(entry) => {
                mutator(&mut entry.session);
                entry.last_access = now;
                true
            }
            None => false,
        }
    }

    /// Drop all state for `key`
    pub fn clear(&self, key: SessionKey) {
        self.entries.lock().unwrap().remove(&key);
    }

    /// Remove every session idle for longer than the TTL
    pub fn evict_expired(&self) -> usize {
        self.evict_expired_at(Instant::now())
    }

    pub(crate) fn evict_expired_at(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        before - entries.len()
    }

    #[allow(dead_code)] // Used in tests
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    #[allow(dead_code)] // Used in tests
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when a live entry exists; an expired one is removed
    fn take_live(
        &self,
        entries: &mut HashMap<SessionKey, Entry>,
        key: SessionKey,
        now: Instant,
    ) -> bool {
        let expired = match entries.get(&key) {
            None => return false,
            Some(entry) => self.is_expired(entry, now),
        };
        if expired {
            entries.remove(&key);
        }
        !expired
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        now.saturating_duration_since(entry.last_access) >= self.ttl
    }
}
