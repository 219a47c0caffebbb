//! Password hashing for credential accounts.
//!
//! Signup stores an Argon2id PHC string; login verifies the candidate
//! against it. A stored hash that fails to parse is an internal error,
//! never a silent mismatch, so corrupted rows surface instead of locking
//! the account out.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher as _, PasswordVerifier, Version};
use rentfolio_application::PasswordHasher;
use rentfolio_core::{AppError, AppResult};

/// Memory cost in KiB (OWASP password-storage baseline).
const MEMORY_COST_KIB: u32 = 19_456;
/// Passes over memory.
const TIME_COST: u32 = 2;
/// Lanes; account creation is not throughput-bound.
const PARALLELISM: u32 = 1;

/// Argon2id hasher behind the signup and login flows.
#[derive(Clone)]
pub struct Argon2PasswordHasher {
    inner: Argon2<'static>,
}

impl Argon2PasswordHasher {
    /// Creates the hasher with the account password policy baked in.
    #[must_use]
    pub fn new() -> Self {
        let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)
            .unwrap_or_else(|_| Params::default());

        Self {
            inner: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }
}

impl Default for Argon2PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.inner
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|error| AppError::Internal(format!("password hashing failed: {error}")))
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let stored = PasswordHash::new(hash).map_err(|error| {
            AppError::Internal(format!("stored password hash is malformed: {error}"))
        })?;

        match self.inner.verify_password(password.as_bytes(), &stored) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(error) => Err(AppError::Internal(format!(
                "password verification failed: {error}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimum_length_signup_password_round_trips() -> AppResult<()> {
        let hasher = Argon2PasswordHasher::new();

        // Eight characters is the shortest password signup accepts.
        let stored = hasher.hash_password("pass1234")?;
        assert!(stored.starts_with("$argon2id$"));
        assert!(hasher.verify_password("pass1234", &stored)?);
        Ok(())
    }

    #[test]
    fn identical_passwords_hash_to_distinct_strings() -> AppResult<()> {
        let hasher = Argon2PasswordHasher::new();

        let first = hasher.hash_password("shared-password")?;
        let second = hasher.hash_password("shared-password")?;

        // Per-hash salts keep equal passwords unlinkable at rest.
        assert_ne!(first, second);
        assert!(hasher.verify_password("shared-password", &second)?);
        Ok(())
    }

    #[test]
    fn login_with_the_wrong_password_is_a_clean_mismatch() -> AppResult<()> {
        let hasher = Argon2PasswordHasher::new();

        let stored = hasher.hash_password("the-real-password")?;
        assert!(!hasher.verify_password("the-real-passwort", &stored)?);
        Ok(())
    }

    #[test]
    fn corrupted_stored_hash_is_an_error_not_a_mismatch() {
        let hasher = Argon2PasswordHasher::new();

        let result = hasher.verify_password("anything", "not-a-phc-string");
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
