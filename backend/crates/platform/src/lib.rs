//! Platform Crate - Technical Infrastructure
//!
//! Domain-agnostic building blocks used by the feature crates:
//! - Randomness and encodings for codes and tokens
//! - Password hashing (Argon2id with optional pepper)
//! - Outbound mail over an SMTP relay

pub mod crypto;
pub mod mail;
pub mod password;
