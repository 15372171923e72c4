//! Credential and session persistence.
//!
//! Both stores live in the same database. Redis is the production backend;
//! the in-memory backend serves tests and local development.

pub mod memory;
pub mod session;
pub mod user;

use crate::config::ConfigError;
use crate::models::{SessionRecord, StoredUser};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub use memory::{MemorySessionStore, MemoryUserStore};
pub use session::RedisSessionStore;
pub use user::RedisUserStore;

/// Errors raised by a backing store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Store unreachable or timed out.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Stored payload could not be decoded.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// Write rejected because the key is already taken.
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Unavailable(format!("Redis error: {}", err))
    }
}

/// Persisted user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Looks up a user by id.
    async fn get_user(&self, id: &str) -> Result<Option<StoredUser>, StoreError>;

    /// Looks up a user by unique username.
    async fn find_by_username(&self, username: &str) -> Result<Option<StoredUser>, StoreError>;

    /// Inserts a new user. Fails with [`StoreError::Conflict`] if the username is taken.
    async fn create_user(&self, user: &StoredUser) -> Result<(), StoreError>;

    /// Removes a user and its username index.
    async fn delete_user(&self, id: &str) -> Result<(), StoreError>;
}

/// Server-side session persistence.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetches a session by id.
    async fn load(&self, id: &str) -> Result<Option<SessionRecord>, StoreError>;

    /// Writes the full record, creating or replacing it.
    async fn save(&self, session: &SessionRecord) -> Result<(), StoreError>;

    /// Refreshes the expiry of an existing record. Never recreates a destroyed one.
    async fn touch(&self, session: &SessionRecord) -> Result<(), StoreError>;

    /// Deletes a session.
    async fn destroy(&self, id: &str) -> Result<(), StoreError>;
}

/// Scheme selecting the in-process backend.
pub const MEMORY_SCHEME: &str = "memory://";

/// Store backend selected by `DATABASE_URL`.
#[derive(Clone)]
pub enum Backend {
    Memory,
    Redis(redis::Client),
}

impl Backend {
    /// Parse `DATABASE_URL`. Does not connect.
    pub fn open(database_url: &str) -> Result<Self, ConfigError> {
        if database_url.starts_with(MEMORY_SCHEME) {
            return Ok(Backend::Memory);
        }
        redis::Client::open(database_url)
            .map(Backend::Redis)
            .map_err(|e| ConfigError::InvalidValue("DATABASE_URL".to_string(), e.to_string()))
    }

    /// User and session stores sharing this backend.
    pub fn stores(&self, timeout: Duration) -> (Arc<dyn UserStore>, Arc<dyn SessionStore>) {
        match self {
            Backend::Memory => (
                Arc::new(MemoryUserStore::new()),
                Arc::new(MemorySessionStore::new()),
            ),
            Backend::Redis(client) => (
                Arc::new(RedisUserStore::new(client.clone(), timeout)),
                Arc::new(RedisSessionStore::new(client.clone(), timeout)),
            ),
        }
    }

    /// Round-trip to the backend.
    pub async fn ping(&self, timeout: Duration) -> Result<(), StoreError> {
        let Backend::Redis(client) = self else {
            return Ok(());
        };
        let mut con = connect(client, timeout).await?;
        with_timeout(timeout, async {
            let _: String = redis::cmd("PING").query_async(&mut con).await?;
            Ok(())
        })
        .await
    }
}

/// Open a multiplexed Redis connection, bounded by `timeout`.
pub(crate) async fn connect(
    client: &redis::Client,
    timeout: Duration,
) -> Result<redis::aio::MultiplexedConnection, StoreError> {
    match tokio::time::timeout(timeout, client.get_multiplexed_async_connection()).await {
        Ok(Ok(con)) => Ok(con),
        Ok(Err(e)) => Err(StoreError::Unavailable(format!("Redis connection error: {}", e))),
        Err(_) => Err(StoreError::Unavailable(format!(
            "Redis connection timed out after {}ms",
            timeout.as_millis()
        ))),
    }
}

/// Bound a single store operation by `timeout`.
pub(crate) async fn with_timeout<T, F>(timeout: Duration, fut: F) -> Result<T, StoreError>
where
    F: std::future::Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(timeout, fut).await.map_err(|_| {
        StoreError::Unavailable(format!("Store operation timed out after {}ms", timeout.as_millis()))
    })?
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Corrupt(format!("JSON serialize: {}", e)))
}

pub(crate) fn from_json<T: serde::de::DeserializeOwned>(data: &str) -> Result<T, StoreError> {
    serde_json::from_str(data).map_err(|e| StoreError::Corrupt(format!("JSON deserialize: {}", e)))
}
