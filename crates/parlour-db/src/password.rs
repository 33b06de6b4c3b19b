//! Argon2 password hashing for back-office users.
//!
//! Hashes are stored in PHC string format, so the salt and parameters
//! travel with the hash.

use std::sync::OnceLock;

use crate::error::{DbError, DbResult};

/// Hashes a password for storage.
pub fn hash_password(password: &str) -> DbResult<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Verifies a password against a stored hash. A malformed hash never
/// verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Runs a full verify against a throwaway hash with the same parameters
/// as stored ones, so a login for an unknown email costs the same as one
/// for a known email.
pub fn verify_against_dummy(password: &str) {
    let dummy = DUMMY_HASH.get_or_init(|| hash_password("parlour-no-such-user").ok());
    if let Some(hash) = dummy {
        let _ = verify_password(password, hash);
    }
}

static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

#[cfg(test)]
pub(crate) fn dummy_hash() -> Option<&'static str> {
    DUMMY_HASH.get().and_then(|h| h.as_deref())
}
