use std::fmt;

use kernel::id::PrincipalId;

use crate::domain::value_object::role::Role;

/// The identity a request acts as.
///
/// `role` is kept as the raw code carried by the token (or the store) so
/// that an unrecognized value reaches the authorization gate and is
/// rejected there rather than being coerced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: PrincipalId,
    pub role: String,
}

impl Principal {
    pub fn new(id: PrincipalId, role: impl Into<String>) -> Self {
        Self {
            id,
            role: role.into(),
        }
    }
}

/// What sign-in needs to check a password.
#[derive(Clone)]
pub struct PrincipalCredentials {
    pub id: PrincipalId,
    pub role: String,
    pub password_digest: String,
}

impl fmt::Debug for PrincipalCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrincipalCredentials")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("password_digest", &"[HASH]")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct NewPrincipal {
    pub id: PrincipalId,
    pub email: String,
    pub password_digest: String,
    pub role: Role,
}
