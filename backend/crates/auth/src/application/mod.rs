//! Application Layer
//!
//! Use cases and application services.

pub mod authorization_gate;
pub mod config;
pub mod register;
pub mod remove_account;
pub mod revoke_session;
pub mod session_validator;
pub mod sign_in;
pub mod token_issuer;
pub mod update_email;
pub mod update_password;
pub mod verification_cache;

// Re-exports
pub use authorization_gate::{AuthorizationGate, Decision};
pub use config::{AuthConfig, RoleSource, SigningKey};
pub use register::{RegisterInput, RegisterOutput, RegisterUseCase};
pub use remove_account::RemoveAccountUseCase;
pub use revoke_session::RevokeSessionUseCase;
pub use session_validator::{SessionState, SessionValidator, ValidatedSession};
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use token_issuer::TokenIssuer;
pub use update_email::{UpdateEmailInput, UpdateEmailUseCase};
pub use update_password::{UpdatePasswordInput, UpdatePasswordUseCase};
pub use verification_cache::{VerificationCache, VerifiedAddress};
