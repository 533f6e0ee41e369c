//! Session Validator
//!
//! Decides, per request, what a presented access token is worth:
//!
//! | signature | `exp`    | refresh token on record | state                |
//! |-----------|----------|-------------------------|----------------------|
//! | invalid   | -        | -                       | `Malformed`          |
//! | valid     | not past | -                       | `Valid`              |
//! | valid     | past     | live                    | `ExpiredRefreshable` |
//! | valid     | past     | expired or missing      | `ExpiredTerminal`    |
//!
//! Only `Valid` and `ExpiredRefreshable` yield a session; the latter also
//! yields a freshly minted access token. Nothing is cached between requests.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::application::token_issuer::TokenIssuer;
use crate::domain::entity::principal::Principal;
use crate::domain::repository::RefreshTokenRepository;
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Valid,
    ExpiredRefreshable,
    ExpiredTerminal,
    Malformed,
}

#[derive(Debug, Clone)]
pub struct ValidatedSession {
    pub principal: Principal,
    pub state: SessionState,
    /// Set when the presented token was silently renewed
    pub renewed_token: Option<String>,
}

pub struct SessionValidator<R> {
    refresh_repo: Arc<R>,
    issuer: Arc<TokenIssuer>,
    config: Arc<AuthConfig>,
}

impl<R> Clone for SessionValidator<R> {
    fn clone(&self) -> Self {
        Self {
            refresh_repo: self.refresh_repo.clone(),
            issuer: self.issuer.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R> SessionValidator<R>
where
    R: RefreshTokenRepository,
{
    pub fn new(refresh_repo: Arc<R>, issuer: Arc<TokenIssuer>, config: Arc<AuthConfig>) -> Self {
        Self {
            refresh_repo,
            issuer,
            config,
        }
    }

    /// State of `raw` without minting anything.
    pub async fn classify(&self, raw: &str) -> AuthResult<SessionState> {
        Ok(self
            .evaluate(raw)
            .await?
            .map_or(SessionState::Malformed, |(state, _)| state))
    }

    pub async fn validate(&self, raw: &str) -> AuthResult<ValidatedSession> {
        match self.evaluate(raw).await? {
            None => Err(AuthError::Malformed),
            Some((SessionState::Valid, principal)) => Ok(ValidatedSession {
                principal,
                state: SessionState::Valid,
                renewed_token: None,
            }),
            Some((SessionState::ExpiredRefreshable, principal)) => {
                let renewed = self.issuer.mint_access_token(
                    &principal.id,
                    &principal.role,
                    self.config.access_token_ttl,
                )?;
                tracing::info!(principal_id = %principal.id, "Access token renewed");

                Ok(ValidatedSession {
                    principal,
                    state: SessionState::ExpiredRefreshable,
                    renewed_token: Some(renewed),
                })
            }
            Some((_, principal)) => {
                tracing::info!(principal_id = %principal.id, "Session past refresh window");
                Err(AuthError::SessionExpired)
            }
        }
    }

    /// `None` when the token cannot be trusted at all.
    async fn evaluate(&self, raw: &str) -> AuthResult<Option<(SessionState, Principal)>> {
        let Ok(claims) = self.issuer.decode(raw) else {
            return Ok(None);
        };
        let Ok(id) = claims.principal_id() else {
            return Ok(None);
        };

        let now = Utc::now();
        if !claims.is_expired_at(now) {
            return Ok(Some((SessionState::Valid, Principal::new(id, claims.role))));
        }

        let state = match self.refresh_repo.get_refresh_token_expiry(&id).await? {
            Some(expires_at) if now <= expires_at => SessionState::ExpiredRefreshable,
            _ => SessionState::ExpiredTerminal,
        };

        Ok(Some((state, Principal::new(id, claims.role))))
    }
}
