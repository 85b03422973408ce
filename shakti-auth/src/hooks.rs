// Authentication and role-gate hooks.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use shakti_core::{BeforeHook, HookContext, ShaktiError};

use crate::jwt::TokenService;
use crate::principal::{Principal, Role};

/// What the auth hooks need from a params type.
pub trait AuthParams: Clone + Send + Sync {
    /// Transport that issued the call; `None` for internal calls.
    fn provider(&self) -> Option<&str>;
    fn headers(&self) -> &HashMap<String, String>;
    fn principal(&self) -> Option<&Principal>;
    fn set_principal(&mut self, principal: Principal);

    fn is_internal(&self) -> bool {
        self.provider().map(str::trim).unwrap_or("").is_empty()
    }
}

/// `Authorization: Bearer <token>` (or `JWT <token>`, or a bare token).
pub fn extract_bearer_token(headers: &HashMap<String, String>) -> Option<String> {
    let raw = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("authorization"))
        .map(|(_, v)| v.trim())?;
    if raw.is_empty() {
        return None;
    }
    let token = match raw.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("jwt") => {
            token.trim()
        }
        Some(_) => return None,
        None => raw,
    };
    (!token.is_empty()).then(|| token.to_string())
}

/// Verifies the bearer token of external calls and stores the principal
/// on the params. Internal calls pass through untouched.
pub struct Authenticate {
    tokens: Arc<TokenService>,
}

impl Authenticate {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl<R, P> BeforeHook<R, P> for Authenticate
where
    R: Send + 'static,
    P: AuthParams + 'static,
{
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()> {
        if ctx.params.principal().is_some() || ctx.params.is_internal() {
            return Ok(());
        }

        let token = extract_bearer_token(ctx.params.headers())
            .ok_or_else(|| ShaktiError::not_authenticated("Not authenticated").into_anyhow())?;
        let principal = self.tokens.verify(&token)?.into_principal();

        ctx.params.set_principal(principal);
        Ok(())
    }
}

/// Admits principals whose role satisfies `area` and who belong to the
/// tenant the call runs in. SuperAdmins pass the tenant check.
pub struct RequireRole {
    area: Role,
}

impl RequireRole {
    pub fn new(area: Role) -> Self {
        Self { area }
    }
}

pub fn authorize(principal: Option<&Principal>, area: Role, tenant_id: Option<&str>) -> Result<()> {
    let Some(principal) = principal else {
        return Err(ShaktiError::not_authenticated("Not authenticated").into_anyhow());
    };
    if !principal.role.satisfies(area) {
        return Err(ShaktiError::forbidden(format!(
            "Access denied: {} role required",
            area.as_str()
        ))
        .into_anyhow());
    }
    if !principal.is_super_admin() && !principal.can_act_in(tenant_id) {
        return Err(ShaktiError::forbidden("Access denied for this tenant").into_anyhow());
    }
    Ok(())
}

#[async_trait]
impl<R, P> BeforeHook<R, P> for RequireRole
where
    R: Send + 'static,
    P: AuthParams + 'static,
{
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()> {
        if ctx.params.is_internal() {
            return Ok(());
        }
        let tenant = ctx.tenant.tenant_id.as_ref().map(|t| t.as_str());
        authorize(ctx.params.principal(), self.area, tenant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(v: &str) -> HashMap<String, String> {
        HashMap::from([("Authorization".to_string(), v.to_string())])
    }

    #[test]
    fn bearer_schemes() {
        assert_eq!(extract_bearer_token(&headers("Bearer abc")).as_deref(), Some("abc"));
        assert_eq!(extract_bearer_token(&headers("jwt abc")).as_deref(), Some("abc"));
        assert_eq!(extract_bearer_token(&headers("abc")).as_deref(), Some("abc"));
        assert_eq!(extract_bearer_token(&headers("Basic abc")), None);
        assert_eq!(extract_bearer_token(&headers("Bearer ")), None);
        assert_eq!(extract_bearer_token(&HashMap::new()), None);
    }

    fn principal(role: Role, tenant: Option<&str>) -> Principal {
        Principal {
            id: "p".into(),
            role,
            tenant_id: tenant.map(str::to_string),
            username: "u".into(),
            name: "n".into(),
            emp_id: None,
        }
    }

    fn code(r: Result<()>) -> Option<u16> {
        r.err().map(|e| ShaktiError::from_anyhow(&e).unwrap().code())
    }

    #[test]
    fn role_and_tenant_gates() {
        let admin = principal(Role::CompanyAdmin, Some("t1"));
        assert_eq!(code(authorize(Some(&admin), Role::TeamIncharge, Some("t1"))), None);
        assert_eq!(code(authorize(Some(&admin), Role::TeamIncharge, Some("t2"))), Some(403));
        assert_eq!(code(authorize(Some(&admin), Role::SuperAdmin, None)), Some(403));
        assert_eq!(code(authorize(None, Role::Telecaller, Some("t1"))), Some(401));

        let root = principal(Role::SuperAdmin, None);
        assert_eq!(code(authorize(Some(&root), Role::CompanyAdmin, Some("t9"))), None);
    }
}
