//! In-memory stores.
//!
//! Suitable for development and tests. Records are lost when the process
//! restarts. Write counters let tests observe how often a session is
//! persisted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::{SessionStore, StoreError, UserStore};
use crate::models::{now_secs, SessionRecord, StoredUser};

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("Lock poisoned".to_owned())
}

/// In-memory user storage.
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<String, StoredUser>>>,
    offline: Arc<AtomicBool>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an unreachable database.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_user(&self, id: &str) -> Result<Option<StoredUser>, StoreError> {
        self.check_online()?;
        Ok(self.users.read().map_err(poisoned)?.get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<StoredUser>, StoreError> {
        self.check_online()?;
        Ok(self
            .users
            .read()
            .map_err(poisoned)?
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, user: &StoredUser) -> Result<(), StoreError> {
        self.check_online()?;
        let mut users = self.users.write().map_err(poisoned)?;
        if users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(format!(
                "username '{}' is already taken",
                user.username
            )));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> Result<(), StoreError> {
        self.check_online()?;
        self.users.write().map_err(poisoned)?.remove(id);
        Ok(())
    }
}

/// In-memory session storage with write accounting.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionRecord>>>,
    offline: Arc<AtomicBool>,
    saves: Arc<AtomicUsize>,
    touches: Arc<AtomicUsize>,
    destroys: Arc<AtomicUsize>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an unreachable database.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Overwrite a raw record, bypassing accounting. Used to age sessions in tests.
    pub fn insert_raw(&self, session: SessionRecord) {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.insert(session.id.clone(), session);
        }
    }

    /// Number of full saves.
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Number of touches that hit an existing record.
    pub fn touches(&self) -> usize {
        self.touches.load(Ordering::SeqCst)
    }

    pub fn destroys(&self) -> usize {
        self.destroys.load(Ordering::SeqCst)
    }

    /// Saves plus touches.
    pub fn writes(&self) -> usize {
        self.saves() + self.touches()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    /// Expired records are returned as stored; the caller destroys them.
    async fn load(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        self.check_online()?;
        let sessions = self.sessions.read().map_err(poisoned)?;
        Ok(sessions.get(id).cloned())
    }

    /// Also evicts expired records nobody came back for.
    async fn save(&self, session: &SessionRecord) -> Result<(), StoreError> {
        self.check_online()?;
        let now = now_secs();
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        sessions.retain(|_, s| !s.is_expired(now));
        sessions.insert(session.id.clone(), session.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn touch(&self, session: &SessionRecord) -> Result<(), StoreError> {
        self.check_online()?;
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        if let Some(existing) = sessions.get_mut(&session.id) {
            *existing = session.clone();
            self.touches.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn destroy(&self, id: &str) -> Result<(), StoreError> {
        self.check_online()?;
        self.sessions.write().map_err(poisoned)?.remove(id);
        self.destroys.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
