//! Argon2id password hashing.
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`), so the
//! salt and cost travel with the hash and older hashes keep verifying after the
//! configured cost changes.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use thiserror::Error;

pub const DEFAULT_MEMORY_KIB: u32 = 19_456;
pub const DEFAULT_ITERATIONS: u32 = 2;
pub const DEFAULT_PARALLELISM: u32 = 1;

const DUMMY_PASSWORD: &str = "usergate-timing-equalizer";

#[derive(Debug, Error)]
pub enum HashError {
    #[error("invalid argon2 parameters: {0}")]
    Params(argon2::Error),
    #[error("failed to hash password: {0}")]
    Hash(argon2::password_hash::Error),
}

/// Argon2id cost settings, fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: DEFAULT_MEMORY_KIB,
            iterations: DEFAULT_ITERATIONS,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

/// Salted one-way hashing and verification of plaintext passwords.
///
/// Cloning is cheap; clones share the lazily computed dummy hash used by
/// [`PasswordHasher::verify_dummy`].
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
    dummy: Arc<OnceCell<String>>,
}

impl PasswordHasher {
    /// # Errors
    /// Returns an error if argon2 rejects the cost parameters.
    pub fn new(cost: HashCost) -> Result<Self, HashError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(HashError::Params)?;

        Ok(Self {
            params,
            dummy: Arc::new(OnceCell::new()),
        })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password with a fresh random salt.
    ///
    /// # Errors
    /// Returns an error only if argon2 fails internally.
    pub fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(HashError::Hash)
    }

    /// Verify a password against a stored PHC string.
    ///
    /// Malformed hashes verify as `false`.
    #[must_use]
    pub fn verify(&self, plaintext: &str, hashed: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hashed) else {
            return false;
        };

        self.argon2()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// Spend the same work as a real verification when no user matched.
    pub fn verify_dummy(&self, plaintext: &str) {
        if let Ok(hash) = self.dummy.get_or_try_init(|| self.hash(DUMMY_PASSWORD)) {
            let _ = self.verify(plaintext, hash);
        }
    }
}
