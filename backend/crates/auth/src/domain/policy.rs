//! Route Access Policy
//!
//! Static table from route identifier to the roles allowed on it, plus two
//! per-route flags. Built once at startup (in code or from JSON) and shared
//! read-only behind an `Arc`.
//!
//! ```json
//! {
//!   "/api/v1/user/profile": { "roles": ["user"] },
//!   "/api/v1/user/account/remove": { "roles": ["user"], "suppressTokenEcho": true },
//!   "/api/v1/auth/signin": { "allowAnonymous": true }
//! }
//! ```

use std::collections::{BTreeSet, HashMap};

use serde::Deserialize;

use crate::domain::value_object::role::Role;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct RouteRule {
    pub roles: BTreeSet<Role>,
    /// Usable without an authenticated principal
    pub allow_anonymous: bool,
    /// Responses must never carry a renewed access token
    pub suppress_token_echo: bool,
}

impl RouteRule {
    pub fn for_roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: roles.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn anonymous() -> Self {
        Self {
            allow_anonymous: true,
            ..Self::default()
        }
    }

    pub fn without_token_echo(mut self) -> Self {
        self.suppress_token_echo = true;
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RouteAccessPolicy {
    rules: HashMap<String, RouteRule>,
}

impl RouteAccessPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, route: impl Into<String>, rule: RouteRule) -> Self {
        self.rules.insert(route.into(), rule);
        self
    }

    /// Parse a policy table. Unknown role codes are rejected here, at load
    /// time, not per request.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn rule(&self, route: &str) -> Option<&RouteRule> {
        self.rules.get(route)
    }

    pub fn allows_anonymous(&self, route: &str) -> bool {
        self.rule(route).is_some_and(|r| r.allow_anonymous)
    }

    /// Routes absent from the table keep the default echo behavior.
    pub fn echoes_renewed_token(&self, route: &str) -> bool {
        self.rule(route).is_none_or(|r| !r.suppress_token_echo)
    }

    /// Whether `role` is listed for `route`. Admin handling lives in the gate.
    pub fn lists(&self, route: &str, role: Role) -> bool {
        self.rule(route).is_some_and(|r| r.roles.contains(&role))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RouteAccessPolicy {
        RouteAccessPolicy::new()
            .with_route("/profile", RouteRule::for_roles([Role::User]))
            .with_route(
                "/account/remove",
                RouteRule::for_roles([Role::User]).without_token_echo(),
            )
            .with_route("/signin", RouteRule::anonymous())
    }

    #[test]
    fn test_lookup() {
        let policy = policy();
        assert!(policy.lists("/profile", Role::User));
        assert!(!policy.lists("/profile", Role::Admin));
        assert!(!policy.lists("/unlisted", Role::User));
        assert!(policy.allows_anonymous("/signin"));
        assert!(!policy.allows_anonymous("/profile"));
    }

    #[test]
    fn test_echo_flag() {
        let policy = policy();
        assert!(policy.echoes_renewed_token("/profile"));
        assert!(!policy.echoes_renewed_token("/account/remove"));
        assert!(policy.echoes_renewed_token("/unlisted"));
    }

    #[test]
    fn test_from_json() {
        let policy = RouteAccessPolicy::from_json(
            r#"{
                "/profile": { "roles": ["user", "admin"] },
                "/account/remove": { "roles": ["user"], "suppressTokenEcho": true },
                "/signin": { "allowAnonymous": true }
            }"#,
        )
        .unwrap();

        assert_eq!(policy.len(), 3);
        assert!(policy.lists("/profile", Role::Admin));
        assert!(!policy.echoes_renewed_token("/account/remove"));
        assert!(policy.allows_anonymous("/signin"));
    }

    #[test]
    fn test_from_json_rejects_unknown_role() {
        let result = RouteAccessPolicy::from_json(r#"{ "/x": { "roles": ["moderator"] } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_json_rejects_unknown_flag() {
        let result = RouteAccessPolicy::from_json(r#"{ "/x": { "public": true } }"#);
        assert!(result.is_err());
    }
}
