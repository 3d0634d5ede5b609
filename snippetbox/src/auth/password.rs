//! Password hashing with Argon2id
//!
//! Hashes are PHC strings, so verification reads its parameters from the hash
//! itself. Both operations are CPU-bound and run on tokio's blocking pool.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2, Params, Version,
};
use thiserror::Error;

/// Argon2 cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHashConfig {
    /// Memory cost in KiB
    pub memory_cost: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for PasswordHashConfig {
    fn default() -> Self {
        Self {
            memory_cost: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl PasswordHashConfig {
    /// Minimal parameters for tests and local development
    #[must_use]
    pub const fn fast() -> Self {
        Self {
            memory_cost: Params::MIN_M_COST,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// Argon2id password hasher
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordHasher {
    config: PasswordHashConfig,
}

impl PasswordHasher {
    /// Create a hasher with the given cost parameters
    #[must_use]
    pub const fn with_config(config: PasswordHashConfig) -> Self {
        Self { config }
    }

    /// Hash a password into a PHC string
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let params = Params::new(
            self.config.memory_cost,
            self.config.iterations,
            self.config.parallelism,
            None,
        )
        .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Verify a password against a PHC string
    ///
    /// `Ok(false)` means the password is wrong; errors mean the hash itself is
    /// unusable.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
        }
    }

    /// [`Self::hash`] on the blocking pool
    pub async fn hash_blocking(self, password: String) -> Result<String, PasswordError> {
        tokio::task::spawn_blocking(move || self.hash(&password)).await?
    }

    /// [`Self::verify`] on the blocking pool
    pub async fn verify_blocking(self, password: String, hash: String) -> Result<bool, PasswordError> {
        tokio::task::spawn_blocking(move || self.verify(&password, &hash)).await?
    }
}

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordError {
    /// Rejected cost parameters
    #[error("invalid argon2 parameters: {0}")]
    InvalidParams(String),

    /// Hashing failed
    #[error("password hashing failed: {0}")]
    HashingFailed(String),

    /// Stored hash is not a valid PHC string
    #[error("invalid password hash: {0}")]
    InvalidHash(String),

    /// Verification failed for a reason other than a mismatch
    #[error("password verification failed: {0}")]
    VerificationFailed(String),

    /// Blocking task panicked or was cancelled
    #[error("hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
