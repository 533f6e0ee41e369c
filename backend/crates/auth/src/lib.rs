//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, route policy, collaborator traits
//! - `application/` - Verification cache, token issuer, session validator,
//!   authorization gate and the use cases built on them
//! - `infra/` - PostgreSQL, SMTP and Argon2 adapters
//! - `presentation/` - HTTP handlers, DTOs, middleware, router
//!
//! ## Features
//! - Email one-time passcodes with resend cooldown and background expiry
//! - Signed access tokens paired with a server-side refresh token
//! - Silent renewal of expired access tokens while the refresh token lives
//! - Static route table deciding which roles may call which routes
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, optional pepper
//! - Codes compared in constant time, consumed on first success
//! - Unknown roles and forbidden routes produce the same response
//! - Refresh tokens never leave the server

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use application::config::{AuthConfig, RoleSource, SigningKey};
pub use application::{AuthorizationGate, SessionValidator, TokenIssuer, VerificationCache};
pub use domain::policy::{RouteAccessPolicy, RouteRule};
pub use domain::value_object::role::Role;
pub use error::{AuthError, AuthResult};
pub use infra::postgres::PgAuthRepository;
pub use infra::smtp::SmtpOtpDelivery;
pub use presentation::{AuthAppState, AuthContext, auth_route_policy, auth_router, require_session};
