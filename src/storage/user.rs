//! User Redis operations.
//!
//! Redis key patterns:
//! - `user:{nanoid}` — individual user data (JSON)
//! - `username:{username}` — username lookup to user_id (STRING)
//!
//! User JSON carries the password hash, so the raw payload is zeroized after
//! deserialization.

use super::{connect, from_json, to_json, with_timeout, StoreError, UserStore};
use crate::models::StoredUser;
use async_trait::async_trait;
use redis::AsyncCommands;
use std::time::Duration;
use zeroize::Zeroizing;

/// Store a new user.
///
/// The username index is claimed first with `SET NX` so two concurrent
/// registrations cannot share a username.
pub async fn store_user<C>(con: &mut C, user: &StoredUser) -> Result<(), StoreError>
where
    C: AsyncCommands,
{
    let user_key = format!("user:{}", user.id);
    let username_key = format!("username:{}", user.username);

    let json = Zeroizing::new(to_json(user)?);

    let claimed: bool = con.set_nx(&username_key, &user.id).await?;
    if !claimed {
        return Err(StoreError::Conflict(format!(
            "username '{}' is already taken",
            user.username
        )));
    }

    con.set::<_, _, ()>(&user_key, json.as_str()).await?;
    Ok(())
}

/// Get a user by ID.
pub async fn get_user<C>(con: &mut C, id: &str) -> Result<Option<StoredUser>, StoreError>
where
    C: AsyncCommands,
{
    let key = format!("user:{}", id);
    let json: Option<String> = con.get(&key).await?;

    match json {
        Some(data) => {
            let zeroizing_data = Zeroizing::new(data);
            Ok(Some(from_json(&zeroizing_data)?))
        }
        None => Ok(None),
    }
}

/// Get a user by username.
///
/// Performs a two-step lookup: username -> user_id -> user data.
pub async fn get_user_by_username<C>(
    con: &mut C,
    username: &str,
) -> Result<Option<StoredUser>, StoreError>
where
    C: AsyncCommands,
{
    let username_key = format!("username:{}", username);
    let user_id: Option<String> = con.get(&username_key).await?;

    match user_id {
        Some(id) => get_user(con, &id).await,
        None => Ok(None),
    }
}

/// Delete a user and its username lookup key.
pub async fn delete_user<C>(con: &mut C, id: &str) -> Result<(), StoreError>
where
    C: AsyncCommands,
{
    let user = get_user(con, id).await?;

    let user_key = format!("user:{}", id);
    con.del::<_, ()>(&user_key).await?;

    if let Some(user) = user {
        let username_key = format!("username:{}", user.username);
        con.del::<_, ()>(&username_key).await?;
    }

    Ok(())
}

/// Redis-backed [`UserStore`].
#[derive(Clone)]
pub struct RedisUserStore {
    client: redis::Client,
    timeout: Duration,
}

impl RedisUserStore {
    pub fn new(client: redis::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl UserStore for RedisUserStore {
    async fn get_user(&self, id: &str) -> Result<Option<StoredUser>, StoreError> {
        let mut con = connect(&self.client, self.timeout).await?;
        with_timeout(self.timeout, get_user(&mut con, id)).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<StoredUser>, StoreError> {
        let mut con = connect(&self.client, self.timeout).await?;
        with_timeout(self.timeout, get_user_by_username(&mut con, username)).await
    }

    async fn create_user(&self, user: &StoredUser) -> Result<(), StoreError> {
        let mut con = connect(&self.client, self.timeout).await?;
        with_timeout(self.timeout, store_user(&mut con, user)).await
    }

    async fn delete_user(&self, id: &str) -> Result<(), StoreError> {
        let mut con = connect(&self.client, self.timeout).await?;
        with_timeout(self.timeout, delete_user(&mut con, id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::now_secs;

    async fn redis_store() -> Option<RedisUserStore> {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let client = redis::Client::open(redis_url).ok()?;
        let store = RedisUserStore::new(client, Duration::from_millis(500));
        match connect(&store.client, store.timeout).await {
            Ok(_) => Some(store),
            Err(_) => {
                eprintln!("Skipping test: Redis not available");
                None
            }
        }
    }

    #[tokio::test]
    async fn test_redis_user_roundtrip() {
        let Some(store) = redis_store().await else {
            return;
        };

        let user = StoredUser {
            id: nanoid::nanoid!(12),
            username: format!("test-{}", nanoid::nanoid!(8)),
            password_hash: "hash".to_string(),
            email: None,
            profile: Default::default(),
            created_at: now_secs(),
        };

        store.create_user(&user).await.unwrap();

        let found = store.find_by_username(&user.username).await.unwrap().unwrap();
        assert_eq!(found.id, user.id);

        // Second registration with the same username is rejected
        let duplicate = StoredUser {
            id: nanoid::nanoid!(12),
            ..user.clone()
        };
        assert!(matches!(
            store.create_user(&duplicate).await,
            Err(StoreError::Conflict(_))
        ));

        store.delete_user(&user.id).await.unwrap();
        assert!(store.get_user(&user.id).await.unwrap().is_none());
        assert!(store.find_by_username(&user.username).await.unwrap().is_none());
    }
}
