//! Argon2id adapter for [`SecretHasher`].

use platform::password::Argon2Hasher;

use crate::domain::repository::SecretHasher;
use crate::error::AuthResult;

impl SecretHasher for Argon2Hasher {
    fn hash(&self, secret: &str) -> AuthResult<String> {
        Ok(Argon2Hasher::hash(self, secret)?)
    }

    fn verify(&self, secret: &str, digest: &str) -> AuthResult<bool> {
        Ok(Argon2Hasher::verify(self, secret, digest)?)
    }
}
