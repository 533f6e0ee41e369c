//! Revoke Session Use Case
//!
//! Drops a principal's refresh token so that its access tokens stop being
//! renewable. Backs sign-out.

use std::sync::Arc;

use kernel::id::PrincipalId;

use crate::domain::repository::RefreshTokenRepository;
use crate::error::AuthResult;

pub struct RevokeSessionUseCase<R> {
    repo: Arc<R>,
}

impl<R> RevokeSessionUseCase<R>
where
    R: RefreshTokenRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Returns whether a refresh token was on record.
    pub async fn execute(&self, principal_id: &PrincipalId) -> AuthResult<bool> {
        let removed = self.repo.delete_refresh_token(principal_id).await?;
        tracing::info!(principal_id = %principal_id, removed, "Refresh token revoked");
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::refresh_token::RefreshToken;
    use crate::test_support::InMemoryRepository;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_execute() {
        let repo = Arc::new(InMemoryRepository::default());
        let use_case = RevokeSessionUseCase::new(repo.clone());
        let id = PrincipalId::new();
        let refresh = RefreshToken::new("cd".repeat(32), Utc::now() + Duration::days(60));
        repo.upsert_refresh_token(&id, &refresh).await.unwrap();

        assert!(use_case.execute(&id).await.unwrap());
        assert!(repo.get_refresh_token_expiry(&id).await.unwrap().is_none());
        assert!(!use_case.execute(&id).await.unwrap());
    }
}
