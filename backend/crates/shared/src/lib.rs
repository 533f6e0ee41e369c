//! Shared Kernel
//!
//! The small vocabulary every crate in the workspace agrees on:
//! - Error classification (`ErrorKind`) and the HTTP-facing `AppError`
//! - Typed identifiers (`Id<T>`, `PrincipalId`)
//!
//! Nothing here knows about tokens, sessions or routes.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
