use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use shakti_core::subdomain::{sanitize_subdomain, suggest_subdomains, validate_subdomain};
use shakti_core::{ShaktiError, ShaktiService, ServiceCapabilities, TenantContext};

use super::tenants_schema::{self, CheckSubdomain, CreateTenant, PatchTenant};
use super::tenants_shared::{self, CHECK_SUBDOMAIN};
use crate::services::{ShaktiParams, ShaktiState};
use crate::store::{Query, Table};
use crate::utils::rows::not_found;
use crate::utils::validator::{require_data, validate, FieldErrors};

/// Tables whose rows belong to a tenant, children first.
const TENANT_TABLES: [Table; 6] = [
    Table::CaseCallLogs,
    Table::CustomerCases,
    Table::Teams,
    Table::ColumnConfigurations,
    Table::Employees,
    Table::CompanyAdmins,
];

const REQUIRED_COLUMNS: [&str; 7] = ["name", "subdomain", "status", "plan", "max_users", "max_connections", "settings"];

pub struct TenantsService {
    state: Arc<ShaktiState>,
}

impl TenantsService {
    pub fn new(state: Arc<ShaktiState>) -> Self {
        Self { state }
    }

    async fn load(&self, id: &str) -> Result<Value> {
        self.state
            .store
            .select_one(&Query::new(Table::Tenants).eq("id", id))
            .await?
            .ok_or_else(|| not_found("Tenant", id))
    }

    /// Sanitized subdomain, or a 422 naming the rule it breaks.
    fn clean_subdomain(raw: &str) -> Result<String> {
        let subdomain = sanitize_subdomain(raw);
        if let Err(e) = validate_subdomain(&subdomain) {
            let mut errors = FieldErrors::default();
            errors.push("subdomain", e.to_string());
            return Err(errors.into_unprocessable(tenants_schema::ERROR_MESSAGE));
        }
        Ok(subdomain)
    }

    /// Columns every tenant must keep cannot be patched to null.
    fn reject_nulls(data: &Value) -> Result<()> {
        let mut errors = FieldErrors::default();
        for column in REQUIRED_COLUMNS {
            if data.get(column).is_some_and(Value::is_null) {
                errors.push(column, format!("{column} cannot be null"));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.into_unprocessable(tenants_schema::ERROR_MESSAGE))
        }
    }

    async fn subdomain_taken(&self, subdomain: &str, except: Option<&str>) -> Result<bool> {
        let mut query = Query::new(Table::Tenants).ilike("subdomain", subdomain);
        if let Some(id) = except {
            query = query.neq("id", id);
        }
        Ok(self.state.store.select_one(&query).await?.is_some())
    }

    async fn ensure_unique(&self, subdomain: &str, except: Option<&str>) -> Result<()> {
        if self.subdomain_taken(subdomain, except).await? {
            return Err(ShaktiError::conflict("A tenant with this subdomain already exists").into_anyhow());
        }
        Ok(())
    }

    async fn check_subdomain(&self, data: Value) -> Result<Value> {
        let input: CheckSubdomain = validate(&data, "Subdomain check failed")?;
        let subdomain = sanitize_subdomain(&input.subdomain);

        if let Err(e) = validate_subdomain(&subdomain) {
            return Ok(json!({"available": false, "valid": false, "error": e.to_string()}));
        }
        if !self.subdomain_taken(&subdomain, None).await? {
            return Ok(json!({"available": true, "valid": true}));
        }

        // every suggestion starts with the base
        let taken: HashSet<String> = self
            .state
            .store
            .select(&Query::new(Table::Tenants).ilike("subdomain", format!("{subdomain}%")))
            .await?
            .iter()
            .filter_map(|t| t.get("subdomain").and_then(Value::as_str))
            .map(str::to_lowercase)
            .collect();
        let suggestions = suggest_subdomains(&subdomain, |candidate| taken.contains(candidate));

        Ok(json!({
            "available": false,
            "valid": true,
            "error": "This subdomain is already taken",
            "suggestions": suggestions,
        }))
    }
}

#[async_trait]
impl ShaktiService<Value, ShaktiParams> for TenantsService {
    fn capabilities(&self) -> ServiceCapabilities {
        tenants_shared::capabilities()
    }

    async fn find(&self, _ctx: &TenantContext, params: ShaktiParams) -> Result<Vec<Value>> {
        let mut query = Query::new(Table::Tenants).newest_first();
        if let Some(status) = params.query_str("status") {
            query = query.eq("status", status);
        }
        self.state.store.select(&query).await
    }

    async fn get(&self, _ctx: &TenantContext, id: &str, _params: ShaktiParams) -> Result<Value> {
        self.load(id).await
    }

    async fn create(&self, _ctx: &TenantContext, data: Value, params: ShaktiParams) -> Result<Value> {
        let input: CreateTenant = validate(&data, tenants_schema::ERROR_MESSAGE)?;
        let subdomain = Self::clean_subdomain(&input.subdomain)?;
        self.ensure_unique(&subdomain, None).await?;

        let row = json!({
            "name": input.name.trim(),
            "subdomain": subdomain,
            "domain": input.domain,
            "status": "active",
            "plan": input.plan.unwrap_or_else(|| "basic".to_string()),
            "max_users": input.max_users.unwrap_or(10),
            "max_connections": input.max_connections.unwrap_or(5),
            "settings": input.settings.unwrap_or_else(|| json!({})),
            "proprietor_name": input.proprietor_name,
            "phone_number": input.phone_number,
            "address": input.address,
            "gst_number": input.gst_number,
            "created_by": params.principal.as_ref().map(|p| p.id.clone()),
        });

        let tenant = self.state.store.insert_one(Table::Tenants, row).await?;
        tracing::info!(subdomain = %subdomain, "tenant created");
        Ok(tenant)
    }

    async fn patch(&self, _ctx: &TenantContext, id: Option<&str>, data: Value, _params: ShaktiParams) -> Result<Value> {
        let id = id.ok_or_else(|| ShaktiError::bad_request("Tenant id is required").into_anyhow())?;
        let input: PatchTenant = validate(&data, tenants_schema::ERROR_MESSAGE)?;
        Self::reject_nulls(&data)?;
        self.load(id).await?;

        let mut patch = Map::new();
        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                let mut errors = FieldErrors::default();
                errors.push("name", "name must not be empty");
                return Err(errors.into_unprocessable(tenants_schema::ERROR_MESSAGE));
            }
            patch.insert("name".into(), json!(name.trim()));
        }
        if let Some(raw) = &input.subdomain {
            let subdomain = Self::clean_subdomain(raw)?;
            self.ensure_unique(&subdomain, Some(id)).await?;
            patch.insert("subdomain".into(), Value::String(subdomain));
        }
        if let Some(status) = input.status {
            patch.insert("status".into(), json!(status));
        }
        if let Some(plan) = &input.plan {
            patch.insert("plan".into(), json!(plan));
        }
        if let Some(max_users) = input.max_users {
            patch.insert("max_users".into(), json!(max_users));
        }
        if let Some(max_connections) = input.max_connections {
            patch.insert("max_connections".into(), json!(max_connections));
        }
        if let Some(settings) = input.settings {
            patch.insert("settings".into(), settings);
        }
        // optional contact details: an explicit null clears them
        let contact = [
            ("domain", &input.domain),
            ("proprietor_name", &input.proprietor_name),
            ("phone_number", &input.phone_number),
            ("address", &input.address),
            ("gst_number", &input.gst_number),
        ];
        for (column, value) in contact {
            if data.get(column).is_some() {
                patch.insert(column.into(), json!(value.as_deref().map(str::trim)));
            }
        }
        if patch.is_empty() {
            return Err(ShaktiError::bad_request("Nothing to update").into_anyhow());
        }

        let updated = self
            .state
            .store
            .update(&Query::new(Table::Tenants).eq("id", id), Value::Object(patch))
            .await?;
        updated.into_iter().next().ok_or_else(|| not_found("Tenant", id))
    }

    async fn remove(&self, _ctx: &TenantContext, id: Option<&str>, _params: ShaktiParams) -> Result<Value> {
        let id = id.ok_or_else(|| ShaktiError::bad_request("Tenant id is required").into_anyhow())?;
        let tenant = self.load(id).await?;

        for table in TENANT_TABLES {
            let removed = self.state.store.delete(&Query::tenant(table, id)).await?;
            if removed > 0 {
                tracing::debug!(table = %table, removed, "tenant rows removed");
            }
        }
        self.state.store.delete(&Query::new(Table::Tenants).eq("id", id)).await?;

        tracing::info!(tenant = id, "tenant removed");
        Ok(tenant)
    }

    async fn custom(
        &self,
        _ctx: &TenantContext,
        method: &'static str,
        data: Option<Value>,
        _params: ShaktiParams,
    ) -> Result<Value> {
        match method {
            CHECK_SUBDOMAIN => self.check_subdomain(require_data(data, method)?).await,
            other => Err(ShaktiError::method_not_allowed(format!("Unknown method `{other}`")).into_anyhow()),
        }
    }
}
