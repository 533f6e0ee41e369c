//! Update Email Use Case
//!
//! Moves a signed-in principal to a new address. The one-time passcode must
//! have been sent to the new address, proving the caller controls it. The
//! refresh token is dropped afterwards so the session ends with the change.

use std::sync::Arc;

use kernel::id::PrincipalId;

use crate::application::verification_cache::VerificationCache;
use crate::domain::repository::{OtpDelivery, PrincipalRepository, RefreshTokenRepository};
use crate::error::{AuthError, AuthResult};

pub struct UpdateEmailInput {
    pub verification_token: String,
    pub code: String,
    /// Already normalized by the caller
    pub new_email: String,
}

pub struct UpdateEmailUseCase<R, D> {
    repo: Arc<R>,
    cache: Arc<VerificationCache<D>>,
}

impl<R, D> UpdateEmailUseCase<R, D>
where
    R: PrincipalRepository + RefreshTokenRepository,
    D: OtpDelivery + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, cache: Arc<VerificationCache<D>>) -> Self {
        Self { repo, cache }
    }

    /// Returns the address now on record.
    pub async fn execute(
        &self,
        principal_id: &PrincipalId,
        input: UpdateEmailInput,
    ) -> AuthResult<String> {
        let new_email = input.new_email.to_lowercase();

        // Checked before the code is consumed
        if self.repo.exists_by_email(&new_email).await? {
            return Err(AuthError::PrincipalExists);
        }

        self.cache
            .verify_for(&input.verification_token, &input.code, &new_email)?;

        if self.repo.update_email(principal_id, &new_email).await? == 0 {
            return Err(AuthError::Unauthenticated);
        }
        self.repo.delete_refresh_token(principal_id).await?;

        tracing::info!(principal_id = %principal_id, "Principal email updated");

        Ok(new_email)
    }
}
