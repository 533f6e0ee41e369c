//! Repository Traits
//!
//! Interfaces for the collaborators this crate does not own: persistence,
//! code delivery and password hashing. Implementations live in `infra`.

use chrono::{DateTime, Utc};
use kernel::id::PrincipalId;

use crate::domain::entity::{
    principal::{NewPrincipal, PrincipalCredentials},
    refresh_token::RefreshToken,
};
use crate::domain::value_object::otp_code::OtpCode;
use crate::error::AuthResult;

/// Principal repository trait
#[trait_variant::make(PrincipalRepository: Send)]
pub trait LocalPrincipalRepository {
    /// Current role code of a principal, `None` if the principal is gone
    async fn lookup_principal_role(&self, id: &PrincipalId) -> AuthResult<Option<String>>;

    /// Find credentials by (lowercased) email
    async fn find_credentials(&self, email: &str) -> AuthResult<Option<PrincipalCredentials>>;

    /// Check if email is already registered
    async fn exists_by_email(&self, email: &str) -> AuthResult<bool>;

    /// Create a new principal
    async fn create(&self, principal: &NewPrincipal) -> AuthResult<()>;

    /// Current email of a principal, `None` if the principal is gone
    async fn find_email(&self, id: &PrincipalId) -> AuthResult<Option<String>>;

    /// Change the email, returning rows updated.
    /// `PrincipalExists` if another principal already holds it.
    async fn update_email(&self, id: &PrincipalId, email: &str) -> AuthResult<u64>;

    /// Replace the password digest, returning rows updated
    async fn update_password(&self, id: &PrincipalId, password_digest: &str) -> AuthResult<u64>;

    /// Delete the principal, returning rows removed
    async fn delete(&self, id: &PrincipalId) -> AuthResult<u64>;
}

/// Refresh token repository trait
#[trait_variant::make(RefreshTokenRepository: Send)]
pub trait LocalRefreshTokenRepository {
    /// Expiry of the principal's refresh token, `None` if there is none
    async fn get_refresh_token_expiry(
        &self,
        id: &PrincipalId,
    ) -> AuthResult<Option<DateTime<Utc>>>;

    /// Store a refresh token, replacing any previous one for the principal
    async fn upsert_refresh_token(&self, id: &PrincipalId, token: &RefreshToken)
    -> AuthResult<()>;

    /// Delete the principal's refresh token, returning rows removed
    async fn delete_refresh_token(&self, id: &PrincipalId) -> AuthResult<u64>;
}

/// Out-of-band delivery of a one-time passcode
#[trait_variant::make(OtpDelivery: Send)]
pub trait LocalOtpDelivery {
    async fn deliver(&self, address: &str, code: &OtpCode) -> AuthResult<()>;
}

/// Password hashing collaborator
pub trait SecretHasher: Send + Sync {
    fn hash(&self, secret: &str) -> AuthResult<String>;

    /// `Ok(false)` on mismatch
    fn verify(&self, secret: &str, digest: &str) -> AuthResult<bool>;
}
