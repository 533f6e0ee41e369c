//! Authorization Gate
//!
//! Deterministic allow/deny for a (principal, route) pair against the
//! static [`RouteAccessPolicy`].

use std::sync::Arc;

use crate::domain::entity::principal::Principal;
use crate::domain::policy::RouteAccessPolicy;
use crate::domain::value_object::role::Role;
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// `None` only on anonymous routes reached without credentials
    pub principal: Option<Principal>,
    /// Whether a renewed access token may be sent back on this route
    pub echo_renewed_token: bool,
}

#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    policy: Arc<RouteAccessPolicy>,
}

impl AuthorizationGate {
    pub fn new(policy: Arc<RouteAccessPolicy>) -> Self {
        Self { policy }
    }

    /// Rules, in order:
    /// 1. no principal: allowed only on anonymous routes
    /// 2. a role code that is not a known [`Role`] is always denied
    /// 3. anonymous routes admit any known role
    /// 4. `Admin` is allowed everywhere
    /// 5. otherwise the route must list the role
    pub fn authorize(&self, principal: Option<&Principal>, route: &str) -> AuthResult<Decision> {
        let echo_renewed_token = self.policy.echoes_renewed_token(route);

        let Some(principal) = principal else {
            if self.policy.allows_anonymous(route) {
                return Ok(Decision {
                    principal: None,
                    echo_renewed_token,
                });
            }
            return Err(AuthError::Unauthenticated);
        };

        let role = Role::from_code(&principal.role)?;

        if self.policy.allows_anonymous(route)
            || role.is_admin()
            || self.policy.lists(route, role)
        {
            Ok(Decision {
                principal: Some(principal.clone()),
                echo_renewed_token,
            })
        } else {
            Err(AuthError::RouteNotPermitted(route.to_owned()))
        }
    }
}
