//! Route access policy for the whole API.

use std::path::Path;

use anyhow::Context;
use auth::{RouteAccessPolicy, auth_route_policy};

pub const AUTH_PREFIX: &str = "/api/v1/auth";

/// Policy from `path` if given, otherwise the built-in auth table.
pub fn load_route_policy(path: Option<&Path>) -> anyhow::Result<RouteAccessPolicy> {
    let Some(path) = path else {
        return Ok(auth_route_policy(AUTH_PREFIX));
    };

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading route policy {}", path.display()))?;
    let policy = RouteAccessPolicy::from_json(&json)
        .with_context(|| format!("parsing route policy {}", path.display()))?;

    tracing::info!(path = %path.display(), routes = policy.len(), "Route policy loaded");
    Ok(policy)
}
