use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use shakti_auth::hash_password;
use shakti_core::{ServiceCapabilities, ShaktiError, ShaktiService, TenantContext};

use super::company_admins_schema::{self, CreateCompanyAdmin};
use super::company_admins_shared;
use crate::models::CompanyAdmin;
use crate::services::employees::employees_shared::ensure_emp_id_free;
use crate::services::{ShaktiParams, ShaktiState};
use crate::store::{Query, Table};
use crate::utils::rows::{from_row, from_rows, not_found, to_value, to_values};
use crate::utils::validator::validate;

/// Company admins are provisioned by the platform operator, usually from the
/// main domain, so the tenant comes from the payload or `?tenant_id=`.
pub struct CompanyAdminsService {
    state: Arc<ShaktiState>,
}

impl CompanyAdminsService {
    pub fn new(state: Arc<ShaktiState>) -> Self {
        Self { state }
    }

    fn tenant_of<'a>(ctx: &'a TenantContext, explicit: Option<&'a str>) -> Result<&'a str> {
        if let Some(id) = explicit {
            return Ok(id);
        }
        Ok(ctx.require_tenant()?.as_str())
    }

    async fn load(&self, ctx: &TenantContext, id: &str, params: &ShaktiParams) -> Result<CompanyAdmin> {
        let mut query = Query::new(Table::CompanyAdmins).eq("id", id);
        if let Some(tenant_id) = params.query_str("tenant_id").or(ctx.tenant_id.as_ref().map(|t| t.as_str())) {
            query = query.eq("tenant_id", tenant_id);
        }
        let row = self
            .state
            .store
            .select_one(&query)
            .await?
            .ok_or_else(|| not_found("Company admin", id))?;
        from_row(row)
    }
}

#[async_trait]
impl ShaktiService<Value, ShaktiParams> for CompanyAdminsService {
    fn capabilities(&self) -> ServiceCapabilities {
        company_admins_shared::capabilities()
    }

    async fn find(&self, ctx: &TenantContext, params: ShaktiParams) -> Result<Vec<Value>> {
        let tenant_id = Self::tenant_of(ctx, params.query_str("tenant_id"))?;
        let rows = self
            .state
            .store
            .select(&Query::tenant(Table::CompanyAdmins, tenant_id).newest_first())
            .await?;
        let admins: Vec<CompanyAdmin> = from_rows(rows)?;
        to_values(&admins)
    }

    async fn get(&self, ctx: &TenantContext, id: &str, params: ShaktiParams) -> Result<Value> {
        to_value(&self.load(ctx, id, &params).await?)
    }

    async fn create(&self, ctx: &TenantContext, data: Value, params: ShaktiParams) -> Result<Value> {
        let input: CreateCompanyAdmin = validate(&data, company_admins_schema::ERROR_MESSAGE)?;
        let tenant_id = Self::tenant_of(ctx, input.tenant_id.as_deref().map(str::trim))?;
        let store = self.state.store.as_ref();

        if store.select_one(&Query::new(Table::Tenants).eq("id", tenant_id)).await?.is_none() {
            return Err(not_found("Tenant", tenant_id));
        }
        let employee_id = input.employee_id.trim();
        ensure_emp_id_free(store, tenant_id, employee_id).await?;

        let row = json!({
            "tenant_id": tenant_id,
            "employee_id": employee_id,
            "name": input.name.trim(),
            "email": input.email,
            "password_hash": hash_password(&input.password, self.state.settings.bcrypt_cost)?,
            "status": "active",
            "created_by": params.principal.as_ref().map(|p| p.id.clone()),
        });
        let admin: CompanyAdmin = from_row(store.insert_one(Table::CompanyAdmins, row).await?)?;

        tracing::info!(tenant = tenant_id, employee_id, "company admin created");
        to_value(&admin)
    }

    async fn remove(&self, ctx: &TenantContext, id: Option<&str>, params: ShaktiParams) -> Result<Value> {
        let id = id.ok_or_else(|| ShaktiError::bad_request("Company admin id is required").into_anyhow())?;
        let admin = self.load(ctx, id, &params).await?;
        self.state
            .store
            .delete(&Query::new(Table::CompanyAdmins).eq("id", id))
            .await?;
        to_value(&admin)
    }
}
