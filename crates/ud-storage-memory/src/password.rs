//! Credential hashing with Argon2.
//!
//! Hashes are stored in PHC string format, so the algorithm and cost
//! parameters travel with each hash. Verification accepts any Argon2
//! variant; [`PasswordHasherService::needs_rehash`] reports hashes that no
//! longer match the configured policy.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use ud_core::{HashAlgorithm, WritableStoreConfig};
use ud_storage::{StorageError, StorageResult};

/// Hashing configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    /// Argon2 variant used for new hashes.
    pub algorithm: HashAlgorithm,
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Time cost (iterations).
    pub time_cost: u32,
    /// Parallelism factor.
    pub parallelism: u32,
    /// Output hash length.
    pub hash_length: u32,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        // OWASP baseline for Argon2id
        Self {
            algorithm: HashAlgorithm::Argon2id,
            memory_cost: 19 * 1024,
            time_cost: 2,
            parallelism: 1,
            hash_length: 32,
        }
    }
}

impl PasswordPolicy {
    /// Creates a policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the policy described by the writable store configuration.
    #[must_use]
    pub fn from_config(config: &WritableStoreConfig) -> Self {
        Self {
            algorithm: config.algorithm,
            memory_cost: config.memory_cost_kib,
            time_cost: config.time_cost,
            parallelism: config.parallelism,
            ..Self::default()
        }
    }

    /// Sets the Argon2 variant.
    #[must_use]
    pub const fn algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Sets the memory cost in KiB.
    #[must_use]
    pub const fn memory_cost(mut self, kib: u32) -> Self {
        self.memory_cost = kib;
        self
    }

    /// Sets the time cost (iterations).
    #[must_use]
    pub const fn time_cost(mut self, iterations: u32) -> Self {
        self.time_cost = iterations;
        self
    }

    /// Sets the parallelism factor.
    #[must_use]
    pub const fn parallelism(mut self, p: u32) -> Self {
        self.parallelism = p;
        self
    }

    fn build_params(&self) -> Result<Params, argon2::Error> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(self.hash_length as usize),
        )
    }
}

const fn argon2_algorithm(algorithm: HashAlgorithm) -> Algorithm {
    match algorithm {
        HashAlgorithm::Argon2id => Algorithm::Argon2id,
        HashAlgorithm::Argon2i => Algorithm::Argon2i,
        HashAlgorithm::Argon2d => Algorithm::Argon2d,
    }
}

/// Credential hasher.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasherService {
    policy: PasswordPolicy,
}

impl PasswordHasherService {
    /// Creates a hasher with the given policy.
    #[must_use]
    pub const fn new(policy: PasswordPolicy) -> Self {
        Self { policy }
    }

    /// Returns the active policy.
    #[must_use]
    pub const fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    /// Hashes a secret and returns the PHC string.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Internal` if the policy parameters are rejected
    /// by Argon2.
    pub fn hash(&self, secret: &str) -> StorageResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let params = self
            .policy
            .build_params()
            .map_err(|e| StorageError::Internal(e.to_string()))?;

        let argon2 = Argon2::new(argon2_algorithm(self.policy.algorithm), Version::V0x13, params);

        argon2
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| StorageError::Internal(e.to_string()))
    }

    /// Verifies a secret against a stored hash in constant time.
    ///
    /// Returns `Ok(false)` on a mismatch.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::InvalidData` if the stored hash is malformed.
    pub fn verify(&self, secret: &str, hash: &str) -> StorageResult<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| StorageError::InvalidData(e.to_string()))?;

        // The PHC string carries the variant and costs.
        match Argon2::default().verify_password(secret.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(StorageError::InvalidData(e.to_string())),
        }
    }

    /// Checks whether a hash was produced with a different variant or cost.
    #[must_use]
    pub fn needs_rehash(&self, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return true;
        };

        let expected = match self.policy.algorithm {
            HashAlgorithm::Argon2id => argon2::ARGON2ID_IDENT,
            HashAlgorithm::Argon2i => argon2::ARGON2I_IDENT,
            HashAlgorithm::Argon2d => argon2::ARGON2D_IDENT,
        };
        if parsed.algorithm != expected {
            return true;
        }

        let params = &parsed.params;
        params.get_decimal("m") != Some(self.policy.memory_cost)
            || params.get_decimal("t") != Some(self.policy.time_cost)
            || params.get_decimal("p") != Some(self.policy.parallelism)
    }
}
