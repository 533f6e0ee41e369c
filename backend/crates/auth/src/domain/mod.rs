//! Domain Layer
//!
//! Entities, value objects, the route policy table and collaborator traits.

pub mod entity;
pub mod policy;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    access_claims::AccessClaims,
    principal::{NewPrincipal, Principal, PrincipalCredentials},
    refresh_token::RefreshToken,
    verification_record::VerificationRecord,
};
pub use policy::{RouteAccessPolicy, RouteRule};
pub use repository::{OtpDelivery, PrincipalRepository, RefreshTokenRepository, SecretHasher};
pub use value_object::{otp_code::OtpCode, role::Role, verification_token::VerificationToken};
