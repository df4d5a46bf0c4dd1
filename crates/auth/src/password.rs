//! Credential hashing and verification.
//!
//! Argon2id in PHC string format with a per-hash random salt. The work factor
//! is configurable; the defaults already exceed the required minimum.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use stockroom_core::{DomainError, DomainResult};

/// Salted, slow credential hasher.
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Construct with explicit Argon2 parameters (memory KiB, iterations,
    /// parallelism). Rejected parameters are a configuration error.
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> DomainResult<Self> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| DomainError::validation(format!("invalid argon2 parameters: {e}")))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a secret, producing a PHC-format digest
    /// (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`).
    pub fn hash(&self, secret: &str) -> DomainResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let digest = self
            .argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| DomainError::validation(format!("password hashing failed: {e}")))?;
        Ok(digest.to_string())
    }

    /// Verify a secret against a stored digest.
    ///
    /// Returns `false` for a mismatch *and* for an unparseable digest: the
    /// caller maps both to the same generic credentials error, so nothing is
    /// learned from a corrupt row either.
    pub fn verify(&self, secret: &str, digest: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(digest) else {
            return false;
        };
        self.argon2
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new()
    }
}
