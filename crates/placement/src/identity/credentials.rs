use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// One-way credential hashing capability injected into the user directory.
pub trait CredentialHasher: Send + Sync {
    /// Produce a salted digest suitable for storage.
    fn hash(&self, plaintext: &str) -> Result<String, CredentialError>;
    /// Check a plaintext candidate against a stored digest.
    fn verify(&self, plaintext: &str, digest: &str) -> bool;
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("unable to hash credential: {0}")]
    Hash(String),
}

/// Argon2id with the crate's default parameters and a random per-credential salt.
#[derive(Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| CredentialError::Hash(err.to_string()))
    }

    fn verify(&self, plaintext: &str, digest: &str) -> bool {
        match PasswordHash::new(digest) {
            Ok(parsed) => self
                .argon2
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}
