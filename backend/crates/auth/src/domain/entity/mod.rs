//! Entity Module

pub mod access_claims;
pub mod principal;
pub mod refresh_token;
pub mod verification_record;
