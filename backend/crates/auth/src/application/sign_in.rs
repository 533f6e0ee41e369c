//! Sign In Use Case
//!
//! Checks email + password, then issues an access token to the client and a
//! refresh token to the store. The refresh token never leaves the server.

use std::sync::Arc;

use kernel::id::PrincipalId;

use crate::application::config::AuthConfig;
use crate::application::token_issuer::TokenIssuer;
use crate::domain::repository::{PrincipalRepository, RefreshTokenRepository, SecretHasher};
use crate::error::{AuthError, AuthResult};

pub struct SignInInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct SignInOutput {
    pub principal_id: PrincipalId,
    pub role: String,
    pub access_token: String,
}

pub struct SignInUseCase<R, H: ?Sized> {
    repo: Arc<R>,
    hasher: Arc<H>,
    issuer: Arc<TokenIssuer>,
    config: Arc<AuthConfig>,
}

impl<R, H> SignInUseCase<R, H>
where
    R: PrincipalRepository + RefreshTokenRepository,
    H: SecretHasher + ?Sized,
{
    pub fn new(
        repo: Arc<R>,
        hasher: Arc<H>,
        issuer: Arc<TokenIssuer>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            repo,
            hasher,
            issuer,
            config,
        }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<SignInOutput> {
        let email = input.email.trim().to_lowercase();

        let credentials = self
            .repo
            .find_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self
            .hasher
            .verify(&input.password, &credentials.password_digest)?
        {
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self.issuer.mint_access_token(
            &credentials.id,
            &credentials.role,
            self.config.access_token_ttl,
        )?;

        // Replaces any refresh token from an earlier sign-in
        let refresh_token = self.issuer.mint_refresh_token();
        self.repo
            .upsert_refresh_token(&credentials.id, &refresh_token)
            .await?;

        tracing::info!(
            principal_id = %credentials.id,
            role = %credentials.role,
            "Principal signed in"
        );

        Ok(SignInOutput {
            principal_id: credentials.id,
            role: credentials.role,
            access_token,
        })
    }
}
