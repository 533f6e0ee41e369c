//! Auth Error Types
//!
//! Auth-specific variants that integrate with the unified
//! `kernel::error::AppError` system. Every variant logs itself once, at the
//! level it deserves, before it is rendered.

use std::time::Duration;

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Shown for both authorization denials so a caller cannot tell an unknown
/// role from a route it may not use.
const ENDPOINT_NOT_AVAILABLE: &str = "Endpoint not available";

#[derive(Debug, Error)]
pub enum AuthError {
    /// Verification token unknown or already consumed
    #[error("Verification not found")]
    NotFound,

    /// Verification code past its window
    #[error("Verification code expired")]
    Expired,

    /// Wrong verification code; the pending record is kept
    #[error("Verification code does not match")]
    Mismatch,

    /// Resend cooldown not yet elapsed
    #[error("Resend not allowed yet ({}s remaining)", remaining.as_secs())]
    TooSoon { remaining: Duration },

    /// Access token unparseable, unsigned or signed by someone else
    #[error("Malformed access token")]
    Malformed,

    /// Access token expired and no live refresh token on record
    #[error("Session expired")]
    SessionExpired,

    /// No credential presented on a protected route
    #[error("Authentication required")]
    Unauthenticated,

    /// Outbound code delivery failed
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Route not permitted: {0}")]
    RouteNotPermitted(String),

    /// Key or algorithm failure while signing
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Email or password wrong
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Principal already exists")]
    PrincipalExists,

    #[error("Password validation failed: {0}")]
    PasswordValidation(String),

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::NotFound | AuthError::UnknownRole(_) | AuthError::RouteNotPermitted(_) => {
                ErrorKind::NotFound
            }
            AuthError::Expired => ErrorKind::Gone,
            AuthError::Mismatch
            | AuthError::PasswordValidation(_)
            | AuthError::InvalidEmail => ErrorKind::BadRequest,
            AuthError::TooSoon { .. } => ErrorKind::TooManyRequests,
            AuthError::Malformed
            | AuthError::SessionExpired
            | AuthError::Unauthenticated
            | AuthError::InvalidCredentials => ErrorKind::Unauthorized,
            AuthError::PrincipalExists => ErrorKind::Conflict,
            AuthError::Delivery(_) => ErrorKind::BadGateway,
            AuthError::Signing(_) | AuthError::Database(_) | AuthError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Convert to AppError
    ///
    /// Server-side details (database messages, key errors, relay replies)
    /// stay in the logs.
    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthError::UnknownRole(_) | AuthError::RouteNotPermitted(_) => {
                AppError::new(self.kind(), ENDPOINT_NOT_AVAILABLE)
            }
            AuthError::TooSoon { remaining } => AppError::new(self.kind(), self.to_string())
                .with_retry_after(remaining.as_secs().max(1)),
            AuthError::SessionExpired => {
                AppError::new(self.kind(), self.to_string()).with_action("Sign in again")
            }
            AuthError::Delivery(_) => AppError::new(self.kind(), "Could not deliver the code")
                .with_action("Check the address and try again"),
            AuthError::Signing(_) | AuthError::Database(_) | AuthError::Internal(_) => {
                AppError::internal("Internal server error")
            }
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Signing(msg) => {
                tracing::error!(message = %msg, "Token signing error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::Delivery(msg) => {
                tracing::error!(message = %msg, "Verification code delivery failed");
            }
            AuthError::UnknownRole(role) => {
                tracing::warn!(role = %role, "Unrecognized role presented");
            }
            AuthError::RouteNotPermitted(route) => {
                tracing::info!(route = %route, "Route not permitted for role");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid sign-in attempt");
            }
            AuthError::Malformed => {
                tracing::warn!("Malformed or forged access token");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<platform::password::PasswordHashError> for AuthError {
    fn from(err: platform::password::PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<platform::mail::MailError> for AuthError {
    fn from(err: platform::mail::MailError) -> Self {
        AuthError::Delivery(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{StatusCode, header};

    #[test]
    fn test_status_mapping() {
        assert_eq!(AuthError::NotFound.status_code(), 404);
        assert_eq!(AuthError::Expired.status_code(), 410);
        assert_eq!(AuthError::Mismatch.status_code(), 400);
        assert_eq!(AuthError::Malformed.status_code(), 401);
        assert_eq!(AuthError::SessionExpired.status_code(), 401);
        assert_eq!(AuthError::Delivery("x".into()).status_code(), 502);
        assert_eq!(AuthError::Signing("x".into()).status_code(), 500);
    }

    #[test]
    fn test_denials_are_indistinguishable() {
        let unknown = AuthError::UnknownRole("root".into()).to_app_error();
        let denied = AuthError::RouteNotPermitted("/admin".into()).to_app_error();

        assert_eq!(unknown.status_code(), denied.status_code());
        assert_eq!(unknown.message(), denied.message());
        assert!(!unknown.message().contains("root"));
        assert!(!denied.message().contains("/admin"));
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AuthError::Signing("InvalidKeyFormat".into()).to_app_error();
        assert!(!err.message().contains("InvalidKeyFormat"));
    }

    #[test]
    fn test_too_soon_sets_retry_after() {
        let response = AuthError::TooSoon {
            remaining: Duration::from_secs(90),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "90");
    }

    #[test]
    fn test_session_expired_suggests_sign_in() {
        let err = AuthError::SessionExpired.to_app_error();
        assert_eq!(err.action(), Some("Sign in again"));
    }
}
