//! Auth Middleware
//!
//! `require_session` runs on every protected route:
//!
//! 1. read the `Authorization: Bearer` credential, if any
//! 2. validate it (silently renewing an expired one when a refresh token is live)
//! 3. run the [`AuthorizationGate`](crate::application::AuthorizationGate) on the request path
//! 4. hand the resulting [`AuthContext`] to the handler
//! 5. echo a renewed token in the configured response header, unless the
//!    route opts out

use axum::extract::{FromRequestParts, OriginalUri, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::application::{RoleSource, SessionValidator};
use crate::domain::entity::principal::Principal;
use crate::domain::repository::{OtpDelivery, SecretHasher};
use crate::error::{AuthError, AuthResult};
use crate::presentation::handlers::{AuthAppState, AuthStore};

const BEARER_PREFIX: &str = "Bearer ";

/// Per-request outcome of `require_session`, stored in request extensions.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    /// `None` on anonymous routes reached without a credential
    pub principal: Option<Principal>,
    pub renewed_token: Option<String>,
}

impl AuthContext {
    pub fn require_principal(&self) -> AuthResult<&Principal> {
        self.principal.as_ref().ok_or(AuthError::Unauthenticated)
    }
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::Unauthenticated)
    }
}

/// Bearer credential from the `Authorization` header.
///
/// Absent header is `Ok(None)`; anything present but unusable is `Malformed`.
pub fn bearer_token(headers: &HeaderMap) -> AuthResult<Option<String>> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| AuthError::Malformed)?;
    let token = value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::Malformed)?;

    Ok(Some(token.to_owned()))
}

/// Middleware that requires a session acceptable to the route policy
pub async fn require_session<R, D, H>(
    State(state): State<AuthAppState<R, D, H>>,
    OriginalUri(uri): OriginalUri,
    mut request: Request,
    next: Next,
) -> Result<Response, Response>
where
    R: AuthStore,
    D: OtpDelivery + Send + Sync + 'static,
    H: SecretHasher + 'static,
{
    let route = uri.path();

    let (principal, renewed_token) =
        resolve_principal(&state, request.headers()).await.map_err(IntoResponse::into_response)?;

    let decision = state
        .gate
        .authorize(principal.as_ref(), route)
        .map_err(IntoResponse::into_response)?;

    request.extensions_mut().insert(AuthContext {
        principal: decision.principal,
        renewed_token: renewed_token.clone(),
    });

    let mut response = next.run(request).await;

    if let Some(token) = renewed_token {
        if decision.echo_renewed_token {
            attach_renewed_token(&mut response, &state.config.renewed_token_header, &token);
        }
    }

    Ok(response)
}

async fn resolve_principal<R, D, H>(
    state: &AuthAppState<R, D, H>,
    headers: &HeaderMap,
) -> AuthResult<(Option<Principal>, Option<String>)>
where
    R: AuthStore,
{
    let Some(raw) = bearer_token(headers)? else {
        return Ok((None, None));
    };

    let validator = SessionValidator::new(
        state.repo.clone(),
        state.issuer.clone(),
        state.config.clone(),
    );
    let session = validator.validate(&raw).await?;

    let principal = match state.config.role_source {
        RoleSource::Token => session.principal,
        RoleSource::Store => {
            let role = state
                .repo
                .lookup_principal_role(&session.principal.id)
                .await?
                .ok_or(AuthError::Unauthenticated)?;
            Principal::new(session.principal.id, role)
        }
    };

    Ok((Some(principal), session.renewed_token))
}

fn attach_renewed_token(response: &mut Response, header: &str, token: &str) {
    match (
        HeaderName::try_from(header),
        HeaderValue::from_str(token),
    ) {
        (Ok(name), Ok(value)) => {
            response.headers_mut().insert(name, value);
        }
        _ => tracing::error!(header = %header, "Renewed token header not representable"),
    }
}
