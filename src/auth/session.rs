//! Per-request session state and its persistence decision.

use crate::flash::{self, FlashCategory};
use crate::models::{SessionRecord, StoredUser};
use base64::{engine::general_purpose, Engine as _};
use rand::Rng;

/// Generate a cryptographically random session id.
///
/// Returns a URL-safe base64 string (43 characters) from 32 random bytes.
pub fn generate_session_id() -> String {
    let mut rng = rand::rng();
    let mut bytes = [0u8; 32];
    rng.fill(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// What to write back to the store once the response is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    /// Full write: new or mutated session.
    Save,
    /// Refresh expiry of an unchanged session whose cool-down elapsed.
    Touch,
    /// Nothing to write.
    Skip,
}

/// The session as seen by one request.
#[derive(Debug)]
pub struct SessionState {
    pub record: SessionRecord,
    /// Not yet persisted.
    pub is_new: bool,
    /// Mutated during this request.
    pub dirty: bool,
    /// Store unreachable at load; the session lives only for this request.
    pub degraded: bool,
    /// Previously persisted id to destroy after an id rotation.
    pub replaced_id: Option<String>,
}

impl SessionState {
    /// Session loaded from the store.
    pub fn loaded(record: SessionRecord) -> Self {
        Self {
            record,
            is_new: false,
            dirty: false,
            degraded: false,
            replaced_id: None,
        }
    }

    /// Brand new anonymous session.
    pub fn fresh(now: u64, ttl_secs: u64) -> Self {
        Self {
            record: SessionRecord::new(generate_session_id(), now, ttl_secs),
            is_new: true,
            dirty: false,
            degraded: false,
            replaced_id: None,
        }
    }

    /// Anonymous session that will never be persisted.
    pub fn in_memory(now: u64, ttl_secs: u64) -> Self {
        Self {
            degraded: true,
            ..Self::fresh(now, ttl_secs)
        }
    }

    /// Attach `user` to the session under a new id.
    ///
    /// A session that was already persisted gets a new id to prevent
    /// fixation; the old record is destroyed on persist.
    pub fn login(&mut self, user: &StoredUser) {
        if !self.is_new && self.replaced_id.is_none() {
            self.replaced_id = Some(self.record.id.clone());
            self.record.id = generate_session_id();
            self.is_new = true;
        }
        self.record.identity = Some(user.identity_ref());
        self.dirty = true;
    }

    /// Clear the identity reference. The record itself is kept.
    pub fn logout(&mut self) {
        self.record.identity = None;
        self.dirty = true;
    }

    pub fn push_flash(&mut self, category: FlashCategory, message: impl Into<String>) {
        flash::push(&mut self.record, category, message);
        self.dirty = true;
    }

    /// Decide how the session must be written back at `now`.
    pub fn persistence(&self, now: u64, touch_after_secs: u64) -> Persistence {
        if self.degraded {
            Persistence::Skip
        } else if self.is_new || self.dirty {
            Persistence::Save
        } else if now.saturating_sub(self.record.last_persisted_at) >= touch_after_secs {
            Persistence::Touch
        } else {
            Persistence::Skip
        }
    }
}
