//! Session Redis operations.
//!
//! Redis key pattern: `session:{id}` — session record (JSON), expiring via
//! Redis TTL at the record's `expires_at`.

use super::{connect, from_json, to_json, with_timeout, SessionStore, StoreError};
use crate::models::{now_secs, SessionRecord};
use async_trait::async_trait;
use redis::AsyncCommands;
use std::time::Duration;
use zeroize::Zeroizing;

/// Seconds until `expires_at`, never less than one so Redis accepts the TTL.
fn ttl_for(session: &SessionRecord) -> u64 {
    session.expires_at.saturating_sub(now_secs()).max(1)
}

/// Write a session with TTL, replacing any previous value.
pub async fn store_session<C>(con: &mut C, session: &SessionRecord) -> Result<(), StoreError>
where
    C: AsyncCommands,
{
    let key = format!("session:{}", session.id);
    let json = to_json(session)?;
    con.set_ex::<_, _, ()>(&key, json, ttl_for(session)).await?;
    Ok(())
}

/// Rewrite a session only if it still exists (`SET .. XX EX`).
///
/// Returns false when the record was already gone.
pub async fn touch_session<C>(con: &mut C, session: &SessionRecord) -> Result<bool, StoreError>
where
    C: AsyncCommands,
{
    let key = format!("session:{}", session.id);
    let json = to_json(session)?;
    let reply: Option<String> = redis::cmd("SET")
        .arg(&key)
        .arg(json)
        .arg("XX")
        .arg("EX")
        .arg(ttl_for(session))
        .query_async(con)
        .await?;
    Ok(reply.is_some())
}

/// Get a session by id.
///
/// The session JSON is zeroized after deserialization.
pub async fn get_session<C>(con: &mut C, id: &str) -> Result<Option<SessionRecord>, StoreError>
where
    C: AsyncCommands,
{
    let key = format!("session:{}", id);
    let json: Option<String> = con.get(&key).await?;

    match json {
        Some(data) => {
            let zeroizing_data = Zeroizing::new(data);
            Ok(Some(from_json(&zeroizing_data)?))
        }
        None => Ok(None),
    }
}

/// Delete a session. Returns true if it existed.
pub async fn delete_session<C>(con: &mut C, id: &str) -> Result<bool, StoreError>
where
    C: AsyncCommands,
{
    let key = format!("session:{}", id);
    let deleted: i32 = con.del(&key).await?;
    Ok(deleted > 0)
}

/// Redis-backed [`SessionStore`].
#[derive(Clone)]
pub struct RedisSessionStore {
    client: redis::Client,
    timeout: Duration,
}

impl RedisSessionStore {
    pub fn new(client: redis::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let mut con = connect(&self.client, self.timeout).await?;
        with_timeout(self.timeout, get_session(&mut con, id)).await
    }

    async fn save(&self, session: &SessionRecord) -> Result<(), StoreError> {
        let mut con = connect(&self.client, self.timeout).await?;
        with_timeout(self.timeout, store_session(&mut con, session)).await
    }

    async fn touch(&self, session: &SessionRecord) -> Result<(), StoreError> {
        let mut con = connect(&self.client, self.timeout).await?;
        let touched = with_timeout(self.timeout, touch_session(&mut con, session)).await?;
        if !touched {
            tracing::debug!(action = "session_touch_skipped", "Session no longer exists");
        }
        Ok(())
    }

    async fn destroy(&self, id: &str) -> Result<(), StoreError> {
        let mut con = connect(&self.client, self.timeout).await?;
        with_timeout(self.timeout, delete_session(&mut con, id)).await?;
        Ok(())
    }
}
