//! Remove Account Use Case
//!
//! Deletes a signed-in principal after a fresh one-time passcode sent to the
//! address on record.

use std::sync::Arc;

use kernel::id::PrincipalId;

use crate::application::verification_cache::VerificationCache;
use crate::domain::repository::{OtpDelivery, PrincipalRepository, RefreshTokenRepository};
use crate::error::{AuthError, AuthResult};

pub struct RemoveAccountUseCase<R, D> {
    repo: Arc<R>,
    cache: Arc<VerificationCache<D>>,
}

impl<R, D> RemoveAccountUseCase<R, D>
where
    R: PrincipalRepository + RefreshTokenRepository,
    D: OtpDelivery + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, cache: Arc<VerificationCache<D>>) -> Self {
        Self { repo, cache }
    }

    pub async fn execute(
        &self,
        principal_id: &PrincipalId,
        verification_token: &str,
        code: &str,
    ) -> AuthResult<()> {
        let email = self
            .repo
            .find_email(principal_id)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        self.cache.verify_for(verification_token, code, &email)?;

        self.repo.delete_refresh_token(principal_id).await?;
        if self.repo.delete(principal_id).await? == 0 {
            return Err(AuthError::Unauthenticated);
        }

        tracing::info!(principal_id = %principal_id, "Principal removed");

        Ok(())
    }
}
