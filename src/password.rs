//! One-way salted password hashing.

use anyhow::anyhow;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

use crate::error::AuthError;

/// Stored in place of a hash for federated-only accounts. Never parses as a
/// PHC string, so `verify` can never succeed against it.
pub const UNUSABLE_PASSWORD: &str = "!";

/// Hash with a fresh per-call salt. Two calls on the same password yield
/// different PHC strings.
///
/// # Errors
/// Returns an error if the hasher itself fails; never on password content.
pub fn hash(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| AuthError::Internal(anyhow!("password hashing failed: {err}")))?;
    Ok(hash.to_string())
}

/// Constant-time verification against a stored PHC string.
///
/// Unparseable stored values (including [`UNUSABLE_PASSWORD`]) are a plain
/// mismatch, not an error.
#[must_use]
pub fn verify(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn hash_then_verify_round_trips() -> Result<()> {
        let stored = hash("Passw0rd!")?;
        assert!(verify("Passw0rd!", &stored));
        assert!(!verify("Passw0rd?", &stored));
        Ok(())
    }

    #[test]
    fn identical_passwords_hash_differently() -> Result<()> {
        let first = hash("Passw0rd!")?;
        let second = hash("Passw0rd!")?;
        assert_ne!(first, second);
        Ok(())
    }

    #[test]
    fn unusable_sentinel_never_verifies() {
        assert!(!verify("", UNUSABLE_PASSWORD));
        assert!(!verify("anything", UNUSABLE_PASSWORD));
    }
}
