//! Request models and storage records.
//!
//! Storage models are serialized to JSON for Redis.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current unix time in seconds.
pub fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

// ============================================================================
// Request Models
// ============================================================================

/// Login form submission.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

// ============================================================================
// Storage Models
// ============================================================================

/// User data as stored in Redis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: String,
    pub username: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub profile: BTreeMap<String, String>,
    pub created_at: u64,
}

impl StoredUser {
    /// Reference embedded in a session for this user.
    pub fn identity_ref(&self) -> IdentityRef {
        IdentityRef::V1 {
            user_id: self.id.clone(),
        }
    }

    /// Public view without the password hash.
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            profile: self.profile.clone(),
        }
    }
}

/// Versioned pointer from a session to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "v")]
pub enum IdentityRef {
    #[serde(rename = "1")]
    V1 { user_id: String },
}

impl IdentityRef {
    pub fn user_id(&self) -> &str {
        match self {
            IdentityRef::V1 { user_id } => user_id,
        }
    }
}

/// The user as exposed to route handlers and views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub profile: BTreeMap<String, String>,
}

/// Session data as stored in Redis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    #[serde(default)]
    pub identity: Option<IdentityRef>,
    /// Pending flash messages keyed by category, in push order.
    #[serde(default)]
    pub flash: BTreeMap<String, Vec<String>>,
    pub created_at: u64,
    pub last_persisted_at: u64,
    pub expires_at: u64,
}

impl SessionRecord {
    /// Fresh anonymous session.
    pub fn new(id: String, now: u64, ttl_secs: u64) -> Self {
        Self {
            id,
            identity: None,
            flash: BTreeMap::new(),
            created_at: now,
            last_persisted_at: now,
            expires_at: now.saturating_add(ttl_secs),
        }
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    /// Stamp the record as written at `now`.
    pub fn mark_persisted(&mut self, now: u64, ttl_secs: u64) {
        self.last_persisted_at = now;
        self.expires_at = now.saturating_add(ttl_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> StoredUser {
        StoredUser {
            id: "u_alice".to_string(),
            username: "alice".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            email: Some("alice@example.com".to_string()),
            profile: BTreeMap::new(),
            created_at: 1,
        }
    }

    #[test]
    fn test_identity_ref_wire_format() {
        let json = serde_json::to_value(alice().identity_ref()).unwrap();
        assert_eq!(json, serde_json::json!({"v": "1", "user_id": "u_alice"}));

        let parsed: IdentityRef = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.user_id(), "u_alice");
    }

    #[test]
    fn test_identity_ref_unknown_version_rejected() {
        let result = serde_json::from_str::<IdentityRef>(r#"{"v":"2","user_id":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_view_hides_password_hash() {
        let json = serde_json::to_string(&alice().view()).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("alice@example.com"));
    }

    #[test]
    fn test_session_expiry() {
        let mut session = SessionRecord::new("abc".to_string(), 100, 50);
        assert_eq!(session.expires_at, 150);
        assert!(!session.is_expired(149));
        assert!(session.is_expired(150));

        session.mark_persisted(140, 50);
        assert_eq!(session.last_persisted_at, 140);
        assert!(!session.is_expired(150));
    }

    #[test]
    fn test_session_record_defaults_missing_fields() {
        let json = r#"{"id":"abc","created_at":1,"last_persisted_at":1,"expires_at":2}"#;
        let session: SessionRecord = serde_json::from_str(json).unwrap();
        assert!(session.identity.is_none());
        assert!(session.flash.is_empty());
    }
}
