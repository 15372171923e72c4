//! Argon2id password hashing.

use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use std::sync::OnceLock;

/// Argon2id with OWASP recommended params: m=19456 (19MB), t=2, p=1.
fn hasher() -> Result<Argon2<'static>, String> {
    let params = Params::new(19456, 2, 1, None).map_err(|e| format!("Argon2 params: {}", e))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, String> {
    let mut salt_bytes = [0u8; 16];
    rand::fill(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| format!("Salt: {}", e))?;

    let hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| format!("Argon2 hash: {}", e))?;
    Ok(hash.to_string())
}

/// Verify a password against a PHC string.
///
/// The digest comparison inside `password-hash` is constant-time. A hash that
/// fails to parse never verifies.
pub fn verify_password(password: &str, phc: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(phc) else {
        tracing::warn!(action = "password_hash_unreadable", "Stored password hash is malformed");
        return false;
    };
    match hasher() {
        Ok(argon2) => argon2.verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

/// A valid hash of an unguessable password.
///
/// Verified against when the username is unknown so both failure paths spend
/// the same time hashing.
pub fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| {
        let mut secret = [0u8; 32];
        rand::fill(&mut secret);
        hash_password(&hex::encode(secret)).unwrap_or_default()
    })
}
