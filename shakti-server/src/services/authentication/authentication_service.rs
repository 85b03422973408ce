use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use shakti_auth::{LocalStrategy, Principal};
use shakti_core::{ServiceCapabilities, ShaktiError, ShaktiService, TenantContext};

use super::authentication_accounts::{CompanyAdminAccounts, EmployeeAccounts, SuperAdminAccounts};
use super::authentication_shared;
use crate::services::{ShaktiParams, ShaktiState};
use crate::utils::rows::str_field;

pub const SUPER_ADMIN_STRATEGY: &str = "super-admin";
pub const LOCAL_STRATEGY: &str = "local";

/// `POST /authentication` logs in, `GET /authentication/me` echoes the
/// caller.
pub struct AuthenticationService {
    state: Arc<ShaktiState>,
    super_admin: LocalStrategy,
    local: LocalStrategy,
}

impl AuthenticationService {
    pub fn new(state: Arc<ShaktiState>) -> Result<Self> {
        let super_admin = LocalStrategy::new(SUPER_ADMIN_STRATEGY, state.settings.super_admin_login())
            .with_resolver(Arc::new(SuperAdminAccounts {
                store: Arc::clone(&state.store),
            }));
        // company admins first, then employees
        let local = LocalStrategy::new(LOCAL_STRATEGY, state.settings.local_login())
            .with_resolver(Arc::new(CompanyAdminAccounts {
                store: Arc::clone(&state.store),
            }))
            .with_resolver(Arc::new(EmployeeAccounts {
                store: Arc::clone(&state.store),
            }));

        super_admin.verify_configuration()?;
        local.verify_configuration()?;

        Ok(Self {
            state,
            super_admin,
            local,
        })
    }

    fn strategy(&self, ctx: &TenantContext, name: &str) -> Result<&LocalStrategy> {
        match name {
            SUPER_ADMIN_STRATEGY if ctx.is_platform() => Ok(&self.super_admin),
            SUPER_ADMIN_STRATEGY => Err(ShaktiError::bad_request(
                "Super admin login is only available on the main domain",
            )
            .into_anyhow()),
            LOCAL_STRATEGY => {
                ctx.require_tenant()?;
                Ok(&self.local)
            }
            other => Err(ShaktiError::bad_request(format!("Invalid authentication strategy: {other}")).into_anyhow()),
        }
    }
}

pub fn session(principal: &Principal) -> Value {
    json!({
        "user": principal,
        "dashboard": principal.role.dashboard_path(),
    })
}

#[async_trait]
impl ShaktiService<Value, ShaktiParams> for AuthenticationService {
    fn capabilities(&self) -> ServiceCapabilities {
        authentication_shared::capabilities()
    }

    async fn create(&self, ctx: &TenantContext, data: Value, _params: ShaktiParams) -> Result<Value> {
        let name = str_field(&data, "strategy")
            .ok_or_else(|| ShaktiError::bad_request("`strategy` is required").into_anyhow())?;
        let strategy = self.strategy(ctx, name)?;

        let (identifier, password) = strategy.credentials(&data)?;
        let principal = strategy.authenticate(ctx, identifier, password).await?;
        let access_token = self.state.tokens.issue(&principal)?;

        tracing::info!(
            strategy = strategy.name(),
            tenant = ctx.label(),
            user = %principal.id,
            role = principal.role.as_str(),
            "logged in"
        );

        let mut out = session(&principal);
        out["accessToken"] = Value::String(access_token);
        out["authentication"] = json!({"strategy": strategy.name()});
        Ok(out)
    }

    async fn get(&self, _ctx: &TenantContext, id: &str, params: ShaktiParams) -> Result<Value> {
        if id != "me" {
            return Err(ShaktiError::not_found(format!("No authentication resource `{id}`")).into_anyhow());
        }
        Ok(session(params.require_principal()?))
    }
}
