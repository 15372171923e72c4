//! Username/password verification against the credential store.

use super::password::{dummy_hash, verify_password};
use crate::models::StoredUser;
use crate::storage::{StoreError, UserStore};

/// Message shown for any failed login. Identical for unknown users and wrong
/// passwords.
pub const INVALID_CREDENTIALS: &str = "Password or username is incorrect";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Password or username is incorrect")]
    InvalidCredentials,

    #[error("Credential store error: {0}")]
    Store(#[from] StoreError),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// Resolve `identifier` to exactly one user and verify `secret` against its hash.
///
/// Unknown identifiers are verified against a dummy hash so both failure paths
/// cost the same.
pub async fn authenticate(
    users: &dyn UserStore,
    identifier: &str,
    secret: &str,
) -> Result<StoredUser, AuthError> {
    let user = users.find_by_username(identifier).await?;

    let phc = user.as_ref().map(|user| user.password_hash.clone());
    let secret = zeroize::Zeroizing::new(secret.to_string());

    let verified = tokio::task::spawn_blocking(move || verify_or_dummy(&secret, phc.as_deref()))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?;

    match user {
        Some(user) if verified => Ok(user),
        _ => Err(AuthError::InvalidCredentials),
    }
}

/// Blocking verification. Without a stored hash the dummy hash is checked
/// instead, so it is also first built off the async workers.
fn verify_or_dummy(secret: &str, phc: Option<&str>) -> bool {
    let verified = verify_password(secret, phc.unwrap_or_else(|| dummy_hash()));
    verified && phc.is_some()
}

/// Hash `password` and create a user.
pub async fn register(
    users: &dyn UserStore,
    username: &str,
    password: &str,
    email: Option<String>,
) -> Result<StoredUser, AuthError> {
    let password = zeroize::Zeroizing::new(password.to_string());
    let password_hash = tokio::task::spawn_blocking(move || super::password::hash_password(&password))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .map_err(AuthError::Hashing)?;

    let user = StoredUser {
        id: nanoid::nanoid!(12),
        username: username.to_string(),
        password_hash,
        email,
        profile: Default::default(),
        created_at: crate::models::now_secs(),
    };
    users.create_user(&user).await?;
    Ok(user)
}
