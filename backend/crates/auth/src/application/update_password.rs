//! Update Password Use Case
//!
//! Replaces a signed-in principal's password after a fresh one-time passcode
//! sent to the address on record, then drops the refresh token.

use std::sync::Arc;

use kernel::id::PrincipalId;

use crate::application::register::validate_password;
use crate::application::verification_cache::VerificationCache;
use crate::domain::repository::{
    OtpDelivery, PrincipalRepository, RefreshTokenRepository, SecretHasher,
};
use crate::error::{AuthError, AuthResult};

pub struct UpdatePasswordInput {
    pub verification_token: String,
    pub code: String,
    pub new_password: String,
}

pub struct UpdatePasswordUseCase<R, D, H: ?Sized> {
    repo: Arc<R>,
    cache: Arc<VerificationCache<D>>,
    hasher: Arc<H>,
}

impl<R, D, H> UpdatePasswordUseCase<R, D, H>
where
    R: PrincipalRepository + RefreshTokenRepository,
    D: OtpDelivery + Send + Sync + 'static,
    H: SecretHasher + ?Sized,
{
    pub fn new(repo: Arc<R>, cache: Arc<VerificationCache<D>>, hasher: Arc<H>) -> Self {
        Self {
            repo,
            cache,
            hasher,
        }
    }

    pub async fn execute(
        &self,
        principal_id: &PrincipalId,
        input: UpdatePasswordInput,
    ) -> AuthResult<()> {
        validate_password(&input.new_password)?;

        let email = self
            .repo
            .find_email(principal_id)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        self.cache
            .verify_for(&input.verification_token, &input.code, &email)?;

        let digest = self.hasher.hash(&input.new_password)?;
        if self.repo.update_password(principal_id, &digest).await? == 0 {
            return Err(AuthError::Unauthenticated);
        }
        self.repo.delete_refresh_token(principal_id).await?;

        tracing::info!(principal_id = %principal_id, "Principal password updated");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::AuthConfig;
    use crate::domain::entity::refresh_token::RefreshToken;
    use crate::test_support::{InMemoryRepository, PlainHasher, RecordingDelivery};
    use chrono::{Duration, Utc};

    const EMAIL: &str = "a@example.com";

    struct Fixture {
        repo: Arc<InMemoryRepository>,
        delivery: Arc<RecordingDelivery>,
        cache: Arc<VerificationCache<RecordingDelivery>>,
        use_case: UpdatePasswordUseCase<InMemoryRepository, RecordingDelivery, PlainHasher>,
        id: PrincipalId,
    }

    async fn fixture() -> Fixture {
        let repo = Arc::new(InMemoryRepository::default());
        let delivery = Arc::new(RecordingDelivery::default());
        let cache = Arc::new(VerificationCache::new(
            delivery.clone(),
            &AuthConfig::default(),
        ));
        let id = repo.insert_principal(EMAIL, "user", &PlainHasher::digest("old password"));
        let refresh = RefreshToken::new("ab".repeat(32), Utc::now() + Duration::days(60));
        repo.upsert_refresh_token(&id, &refresh).await.unwrap();
        let use_case = UpdatePasswordUseCase::new(repo.clone(), cache.clone(), Arc::new(PlainHasher));
        Fixture {
            repo,
            delivery,
            cache,
            use_case,
            id,
        }
    }

    async fn input(f: &Fixture, address: &str, new_password: &str) -> UpdatePasswordInput {
        let token = f.cache.issue(address).await.unwrap();
        let (_, code) = f.delivery.last().unwrap();
        UpdatePasswordInput {
            verification_token: token.to_string(),
            code,
            new_password: new_password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_update_password_rehashes_and_ends_session() {
        let f = fixture().await;
        let input = input(&f, EMAIL, "new password").await;

        f.use_case.execute(&f.id, input).await.unwrap();

        assert_eq!(
            f.repo.password_digest_of(&f.id),
            Some(PlainHasher::digest("new password"))
        );
        assert_eq!(f.repo.refresh_token_count(), 0);
    }

    #[tokio::test]
    async fn test_code_for_another_address_is_rejected() {
        let f = fixture().await;
        let input = input(&f, "attacker@example.com", "new password").await;

        let result = f.use_case.execute(&f.id, input).await;

        assert!(matches!(result, Err(AuthError::Mismatch)));
        assert_eq!(
            f.repo.password_digest_of(&f.id),
            Some(PlainHasher::digest("old password"))
        );
        assert_eq!(f.repo.refresh_token_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_password_keeps_code() {
        let f = fixture().await;
        let input = input(&f, EMAIL, "   ").await;

        let result = f.use_case.execute(&f.id, input).await;

        assert!(matches!(result, Err(AuthError::PasswordValidation(_))));
        assert_eq!(f.cache.len(), 1);
    }

    #[tokio::test]
    async fn test_vanished_principal() {
        let f = fixture().await;
        let input = input(&f, EMAIL, "new password").await;

        let result = f.use_case.execute(&PrincipalId::new(), input).await;

        assert!(matches!(result, Err(AuthError::Unauthenticated)));
        assert_eq!(f.cache.len(), 1);
    }
}
