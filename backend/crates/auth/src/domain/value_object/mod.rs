//! Value Object Module

pub mod otp_code;
pub mod role;
pub mod verification_token;
