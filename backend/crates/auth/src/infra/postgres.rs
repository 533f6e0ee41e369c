//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::PrincipalId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{
    principal::{NewPrincipal, PrincipalCredentials},
    refresh_token::RefreshToken,
};
use crate::domain::repository::{PrincipalRepository, RefreshTokenRepository};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete refresh tokens past their expiry
    pub async fn cleanup_expired_refresh_tokens(&self) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(refresh_tokens_deleted = deleted, "Cleaned up expired refresh tokens");

        Ok(deleted)
    }
}

// ============================================================================
// Principal Repository Implementation
// ============================================================================

impl PrincipalRepository for PgAuthRepository {
    async fn lookup_principal_role(&self, id: &PrincipalId) -> AuthResult<Option<String>> {
        let role = sqlx::query_scalar::<_, String>(
            "SELECT role FROM principals WHERE principal_id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    async fn find_credentials(&self, email: &str) -> AuthResult<Option<PrincipalCredentials>> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            r#"
            SELECT principal_id, role, password_digest
            FROM principals
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CredentialsRow::into_credentials))
    }

    async fn exists_by_email(&self, email: &str) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM principals WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create(&self, principal: &NewPrincipal) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO principals (
                principal_id,
                email,
                password_digest,
                role,
                created_at
            ) VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(principal.id.as_uuid())
        .bind(&principal.email)
        .bind(&principal.password_digest)
        .bind(principal.role.code())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_email(&self, id: &PrincipalId) -> AuthResult<Option<String>> {
        let email = sqlx::query_scalar::<_, String>(
            "SELECT email FROM principals WHERE principal_id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(email)
    }

    async fn update_email(&self, id: &PrincipalId, email: &str) -> AuthResult<u64> {
        let result = sqlx::query("UPDATE principals SET email = $2 WHERE principal_id = $1")
            .bind(id.as_uuid())
            .bind(email)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => Ok(done.rows_affected()),
            // Lost a race with a registration or another change to the same address
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AuthError::PrincipalExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_password(&self, id: &PrincipalId, password_digest: &str) -> AuthResult<u64> {
        let updated =
            sqlx::query("UPDATE principals SET password_digest = $2 WHERE principal_id = $1")
                .bind(id.as_uuid())
                .bind(password_digest)
                .execute(&self.pool)
                .await?
                .rows_affected();

        Ok(updated)
    }

    async fn delete(&self, id: &PrincipalId) -> AuthResult<u64> {
        // refresh_tokens rows go with it (ON DELETE CASCADE)
        let deleted = sqlx::query("DELETE FROM principals WHERE principal_id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Refresh Token Repository Implementation
// ============================================================================

impl RefreshTokenRepository for PgAuthRepository {
    async fn get_refresh_token_expiry(
        &self,
        id: &PrincipalId,
    ) -> AuthResult<Option<DateTime<Utc>>> {
        let expires_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            "SELECT expires_at FROM refresh_tokens WHERE principal_id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(expires_at)
    }

    async fn upsert_refresh_token(&self, id: &PrincipalId, token: &RefreshToken) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (principal_id, token, expires_at, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (principal_id) DO UPDATE SET
                token = EXCLUDED.token,
                expires_at = EXCLUDED.expires_at,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(&token.token)
        .bind(token.expires_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_refresh_token(&self, id: &PrincipalId) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM refresh_tokens WHERE principal_id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    principal_id: Uuid,
    role: String,
    password_digest: String,
}

impl CredentialsRow {
    fn into_credentials(self) -> PrincipalCredentials {
        PrincipalCredentials {
            id: PrincipalId::from_uuid(self.principal_id),
            role: self.role,
            password_digest: self.password_digest,
        }
    }
}
