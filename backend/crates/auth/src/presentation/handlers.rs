//! HTTP Handlers

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use std::sync::Arc;

use crate::application::{
    AuthConfig, AuthorizationGate, RegisterInput, RegisterUseCase, RemoveAccountUseCase,
    RevokeSessionUseCase, SignInInput, SignInUseCase, TokenIssuer, UpdateEmailInput,
    UpdateEmailUseCase, UpdatePasswordInput, UpdatePasswordUseCase, VerificationCache,
};
use crate::domain::policy::RouteAccessPolicy;
use crate::domain::repository::{
    OtpDelivery, PrincipalRepository, RefreshTokenRepository, SecretHasher,
};
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    RegisterRequest, RegisterResponse, RemoveAccountRequest, ResendOtpRequest, SendOtpRequest,
    SessionStatusResponse, SignInRequest, SignInResponse, UpdateEmailRequest,
    UpdateEmailResponse, UpdatePasswordRequest, VerificationResponse,
};
use crate::presentation::middleware::AuthContext;

/// Everything the HTTP layer needs from a principal/refresh-token store.
pub trait AuthStore: PrincipalRepository + RefreshTokenRepository + Send + Sync + 'static {}

impl<T> AuthStore for T where T: PrincipalRepository + RefreshTokenRepository + Send + Sync + 'static
{}

/// Shared state for auth handlers
pub struct AuthAppState<R, D, H> {
    pub repo: Arc<R>,
    pub cache: Arc<VerificationCache<D>>,
    pub hasher: Arc<H>,
    pub issuer: Arc<TokenIssuer>,
    pub gate: AuthorizationGate,
    pub config: Arc<AuthConfig>,
}

// Manual impl: derive would require `R: Clone`, `D: Clone`, `H: Clone`
impl<R, D, H> Clone for AuthAppState<R, D, H> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            cache: self.cache.clone(),
            hasher: self.hasher.clone(),
            issuer: self.issuer.clone(),
            gate: self.gate.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R, D, H> AuthAppState<R, D, H> {
    /// Builds the token issuer from `config`; fails on unusable key material.
    pub fn new(
        repo: Arc<R>,
        cache: Arc<VerificationCache<D>>,
        hasher: Arc<H>,
        config: AuthConfig,
        policy: RouteAccessPolicy,
    ) -> AuthResult<Self> {
        let issuer = TokenIssuer::new(&config)?;

        Ok(Self {
            repo,
            cache,
            hasher,
            issuer: Arc::new(issuer),
            gate: AuthorizationGate::new(Arc::new(policy)),
            config: Arc::new(config),
        })
    }
}

fn normalize_email(raw: &str) -> AuthResult<String> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && domain.contains('.') && !domain.contains('@') =>
        {
            Ok(email)
        }
        _ => Err(AuthError::InvalidEmail),
    }
}

// ============================================================================
// One-time passcodes
// ============================================================================

/// POST /otp/send
pub async fn send_otp<R, D, H>(
    State(state): State<AuthAppState<R, D, H>>,
    Json(req): Json<SendOtpRequest>,
) -> AuthResult<Json<VerificationResponse>>
where
    R: AuthStore,
    D: OtpDelivery + Send + Sync + 'static,
    H: SecretHasher + 'static,
{
    let email = normalize_email(&req.email)?;
    let token = state.cache.issue(&email).await?;

    Ok(Json(VerificationResponse {
        verification_token: token.to_string(),
    }))
}

/// POST /otp/resend
pub async fn resend_otp<R, D, H>(
    State(state): State<AuthAppState<R, D, H>>,
    Json(req): Json<ResendOtpRequest>,
) -> AuthResult<Json<VerificationResponse>>
where
    R: AuthStore,
    D: OtpDelivery + Send + Sync + 'static,
    H: SecretHasher + 'static,
{
    let email = normalize_email(&req.email)?;
    let token = state
        .cache
        .resend(&req.verification_token, &email)
        .await?;

    Ok(Json(VerificationResponse {
        verification_token: token.to_string(),
    }))
}

// ============================================================================
// Register / Sign In
// ============================================================================

/// POST /register
pub async fn register<R, D, H>(
    State(state): State<AuthAppState<R, D, H>>,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    D: OtpDelivery + Send + Sync + 'static,
    H: SecretHasher + 'static,
{
    let use_case = RegisterUseCase::new(
        state.repo.clone(),
        state.cache.clone(),
        state.hasher.clone(),
    );

    let output = use_case
        .execute(RegisterInput {
            verification_token: req.verification_token,
            code: req.code,
            password: req.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            principal_id: output.principal_id.to_string(),
        }),
    ))
}

/// POST /signin
pub async fn sign_in<R, D, H>(
    State(state): State<AuthAppState<R, D, H>>,
    Json(req): Json<SignInRequest>,
) -> AuthResult<Json<SignInResponse>>
where
    R: AuthStore,
    D: OtpDelivery + Send + Sync + 'static,
    H: SecretHasher + 'static,
{
    let use_case = SignInUseCase::new(
        state.repo.clone(),
        state.hasher.clone(),
        state.issuer.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(SignInInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(Json(SignInResponse {
        principal_id: output.principal_id.to_string(),
        role: output.role,
        access_token: output.access_token,
    }))
}

// ============================================================================
// Session (behind `require_session`)
// ============================================================================

/// POST /signout
pub async fn sign_out<R, D, H>(
    State(state): State<AuthAppState<R, D, H>>,
    ctx: AuthContext,
) -> AuthResult<StatusCode>
where
    R: AuthStore,
    D: OtpDelivery + Send + Sync + 'static,
    H: SecretHasher + 'static,
{
    let principal = ctx.require_principal()?;
    RevokeSessionUseCase::new(state.repo.clone())
        .execute(&principal.id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /session
pub async fn session_status(ctx: AuthContext) -> AuthResult<Json<SessionStatusResponse>> {
    let principal = ctx.require_principal()?;

    Ok(Json(SessionStatusResponse {
        principal_id: principal.id.to_string(),
        role: principal.role.clone(),
        renewed: ctx.renewed_token.is_some(),
    }))
}

// ============================================================================
// Account (behind `require_session`, each needs a fresh code)
// ============================================================================

/// POST /account/email
pub async fn update_email<R, D, H>(
    State(state): State<AuthAppState<R, D, H>>,
    ctx: AuthContext,
    Json(req): Json<UpdateEmailRequest>,
) -> AuthResult<Json<UpdateEmailResponse>>
where
    R: AuthStore,
    D: OtpDelivery + Send + Sync + 'static,
    H: SecretHasher + 'static,
{
    let principal = ctx.require_principal()?;
    let new_email = normalize_email(&req.new_email)?;

    let email = UpdateEmailUseCase::new(state.repo.clone(), state.cache.clone())
        .execute(
            &principal.id,
            UpdateEmailInput {
                verification_token: req.verification_token,
                code: req.code,
                new_email,
            },
        )
        .await?;

    Ok(Json(UpdateEmailResponse { email }))
}

/// POST /account/password
pub async fn update_password<R, D, H>(
    State(state): State<AuthAppState<R, D, H>>,
    ctx: AuthContext,
    Json(req): Json<UpdatePasswordRequest>,
) -> AuthResult<StatusCode>
where
    R: AuthStore,
    D: OtpDelivery + Send + Sync + 'static,
    H: SecretHasher + 'static,
{
    let principal = ctx.require_principal()?;
    UpdatePasswordUseCase::new(
        state.repo.clone(),
        state.cache.clone(),
        state.hasher.clone(),
    )
    .execute(
        &principal.id,
        UpdatePasswordInput {
            verification_token: req.verification_token,
            code: req.code,
            new_password: req.new_password,
        },
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /account/remove
pub async fn remove_account<R, D, H>(
    State(state): State<AuthAppState<R, D, H>>,
    ctx: AuthContext,
    Json(req): Json<RemoveAccountRequest>,
) -> AuthResult<StatusCode>
where
    R: AuthStore,
    D: OtpDelivery + Send + Sync + 'static,
    H: SecretHasher + 'static,
{
    let principal = ctx.require_principal()?;
    RemoveAccountUseCase::new(state.repo.clone(), state.cache.clone())
        .execute(&principal.id, &req.verification_token, &req.code)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("  A.Person@Example.COM ").unwrap(),
            "a.person@example.com"
        );
        for bad in ["", "plain", "@example.com", "a@localhost", "a@b@c.com"] {
            assert!(
                matches!(normalize_email(bad), Err(AuthError::InvalidEmail)),
                "{bad} accepted"
            );
        }
    }
}
