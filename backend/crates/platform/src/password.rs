//! Password Hashing and Verification
//!
//! Argon2id with a random salt per hash and an optional application pepper.
//! Input is NFKC-normalized so visually identical passwords hash alike.

use std::fmt;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretBox};
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

/// Argon2id hasher producing PHC strings.
///
/// ```rust
/// use platform::password::Argon2Hasher;
///
/// let hasher = Argon2Hasher::new(None);
/// let digest = hasher.hash("correct horse").unwrap();
/// assert!(hasher.verify("correct horse", &digest).unwrap());
/// ```
pub struct Argon2Hasher {
    pepper: Option<SecretBox<[u8]>>,
}

impl Argon2Hasher {
    pub fn new(pepper: Option<Vec<u8>>) -> Self {
        Self {
            pepper: pepper.map(|p| SecretBox::new(p.into_boxed_slice())),
        }
    }

    /// Normalized password bytes with the pepper appended, wiped on drop.
    fn material(&self, password: &str) -> Zeroizing<Vec<u8>> {
        let normalized: Zeroizing<String> = Zeroizing::new(password.nfkc().collect());
        let mut bytes = Zeroizing::new(normalized.as_bytes().to_vec());
        if let Some(pepper) = &self.pepper {
            bytes.extend_from_slice(pepper.expose_secret());
        }
        bytes
    }

    pub fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        let material = self.material(password);
        let salt = SaltString::generate(&mut OsRng);

        // OWASP recommended defaults: m=19456 (19 MiB), t=2, p=1
        let hash = Argon2::default()
            .hash_password(&material, &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(hash.to_string())
    }

    /// `Ok(false)` on mismatch; `Err` only when `digest` is not a PHC string.
    pub fn verify(&self, password: &str, digest: &str) -> Result<bool, PasswordHashError> {
        let parsed = PasswordHash::new(digest).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        let material = self.material(password);

        Ok(Argon2::default()
            .verify_password(&material, &parsed)
            .is_ok())
    }
}

impl fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argon2Hasher")
            .field("pepper", &self.pepper.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = Argon2Hasher::new(None);
        let digest = hasher.hash("TestPassword123!").unwrap();

        assert!(digest.starts_with("$argon2id$"));
        assert!(hasher.verify("TestPassword123!", &digest).unwrap());
        assert!(!hasher.verify("WrongPassword123!", &digest).unwrap());
    }

    #[test]
    fn test_salt_is_random() {
        let hasher = Argon2Hasher::new(None);
        let a = hasher.hash("same input").unwrap();
        let b = hasher.hash("same input").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_pepper_must_match() {
        let peppered = Argon2Hasher::new(Some(b"my_secret_pepper".to_vec()));
        let digest = peppered.hash("TestPassword123!").unwrap();

        assert!(peppered.verify("TestPassword123!", &digest).unwrap());
        assert!(!Argon2Hasher::new(None).verify("TestPassword123!", &digest).unwrap());

        let other = Argon2Hasher::new(Some(b"wrong_pepper".to_vec()));
        assert!(!other.verify("TestPassword123!", &digest).unwrap());
    }

    #[test]
    fn test_nfkc_normalization() {
        let hasher = Argon2Hasher::new(None);
        // U+FB01 LATIN SMALL LIGATURE FI normalizes to "fi"
        let digest = hasher.hash("\u{FB01}nder").unwrap();
        assert!(hasher.verify("finder", &digest).unwrap());
    }

    #[test]
    fn test_invalid_digest() {
        let hasher = Argon2Hasher::new(None);
        assert!(matches!(
            hasher.verify("anything", "not_a_valid_hash"),
            Err(PasswordHashError::InvalidHashFormat)
        ));
    }

    #[test]
    fn test_debug_redaction() {
        let hasher = Argon2Hasher::new(Some(b"pepper-value".to_vec()));
        let debug_output = format!("{:?}", hasher);
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains("pepper-value"));
    }
}
