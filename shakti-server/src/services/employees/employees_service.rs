use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use shakti_auth::{generate_temporary_password, hash_password, Role};
use shakti_core::{ServiceCapabilities, ShaktiError, ShaktiService, TenantContext};

use super::employees_schema::{self, BulkDelete, CreateEmployee, PatchEmployee, ResetPassword};
use super::employees_shared::{self, ensure_emp_id_free, load_employee, BULK_DELETE, RESET_PASSWORD};
use crate::models::{Employee, EmployeeStatus};
use crate::services::{ShaktiParams, ShaktiState};
use crate::store::{Query, Table};
use crate::utils::rows::{from_row, from_rows, not_found, to_value, to_values};
use crate::utils::validator::{require_data, validate};

pub struct EmployeesService {
    state: Arc<ShaktiState>,
}

impl EmployeesService {
    pub fn new(state: Arc<ShaktiState>) -> Self {
        Self { state }
    }

    fn hash(&self, password: &str) -> Result<String> {
        hash_password(password, self.state.settings.bcrypt_cost)
    }

    /// 409 while `employee` is still in charge of a team.
    async fn ensure_leads_no_team(&self, tenant_id: &str, employee: &Employee) -> Result<()> {
        if employee.role != Role::TeamIncharge {
            return Ok(());
        }
        let leads = self
            .state
            .store
            .count(&Query::tenant(Table::Teams, tenant_id).eq("team_incharge_id", employee.id.as_str()))
            .await?;
        if leads > 0 {
            return Err(ShaktiError::conflict(format!(
                "{} is in charge of {leads} team(s); reassign them first",
                employee.name
            ))
            .into_anyhow());
        }
        Ok(())
    }

    /// Puts the employee's open cases back in the unassigned pool.
    async fn release_open_cases(&self, tenant_id: &str, id: &str) -> Result<usize> {
        let released = self
            .state
            .store
            .update(
                &Query::tenant(Table::CustomerCases, tenant_id)
                    .eq("telecaller_id", id)
                    .is_in("status", ["assigned", "in_progress"]),
                json!({"telecaller_id": null, "status": "new", "assigned_by": null}),
            )
            .await?;
        Ok(released.len())
    }

    /// Deletes one employee. Their open cases go back to the unassigned pool.
    async fn remove_one(&self, tenant_id: &str, id: &str) -> Result<Employee> {
        let store = self.state.store.as_ref();
        let employee = load_employee(store, tenant_id, id).await?;
        self.ensure_leads_no_team(tenant_id, &employee).await?;

        let released_cases = self.release_open_cases(tenant_id, id).await?;
        store.delete(&Query::tenant(Table::Employees, tenant_id).eq("id", id)).await?;

        tracing::info!(tenant = tenant_id, employee = id, released_cases, "employee removed");
        Ok(employee)
    }

    async fn bulk_delete(&self, tenant_id: &str, data: Value) -> Result<Value> {
        let input: BulkDelete = validate(&data, employees_schema::ERROR_MESSAGE)?;
        let mut successful = 0usize;
        let mut errors = Vec::new();

        for id in &input.ids {
            match self.remove_one(tenant_id, id).await {
                Ok(_) => successful += 1,
                Err(e) => {
                    let message = ShaktiError::normalize(e).message;
                    errors.push(json!({"id": id, "error": message}));
                }
            }
        }

        Ok(json!({
            "successful": successful,
            "failed": errors.len(),
            "errors": errors,
        }))
    }

    async fn reset_password(&self, tenant_id: &str, data: Value) -> Result<Value> {
        let input: ResetPassword = validate(&data, employees_schema::ERROR_MESSAGE)?;
        let store = self.state.store.as_ref();
        let employee = load_employee(store, tenant_id, &input.id).await?;

        let temporary = generate_temporary_password();
        store
            .update(
                &Query::tenant(Table::Employees, tenant_id).eq("id", employee.id.as_str()),
                json!({"password_hash": self.hash(&temporary)?}),
            )
            .await?;

        tracing::info!(tenant = tenant_id, employee = %employee.id, "password reset");
        Ok(json!({"temporaryPassword": temporary}))
    }
}

#[async_trait]
impl ShaktiService<Value, ShaktiParams> for EmployeesService {
    fn capabilities(&self) -> ServiceCapabilities {
        employees_shared::capabilities()
    }

    async fn find(&self, ctx: &TenantContext, params: ShaktiParams) -> Result<Vec<Value>> {
        let tenant_id = ctx.require_tenant()?.as_str();
        let mut query = Query::tenant(Table::Employees, tenant_id).newest_first();
        for column in ["role", "status", "team_id"] {
            if let Some(v) = params.query_str(column) {
                query = query.eq(column, v);
            }
        }
        let employees: Vec<Employee> = from_rows(self.state.store.select(&query).await?)?;
        to_values(&employees)
    }

    async fn get(&self, ctx: &TenantContext, id: &str, _params: ShaktiParams) -> Result<Value> {
        let tenant_id = ctx.require_tenant()?.as_str();
        to_value(&load_employee(self.state.store.as_ref(), tenant_id, id).await?)
    }

    async fn create(&self, ctx: &TenantContext, data: Value, params: ShaktiParams) -> Result<Value> {
        let tenant_id = ctx.require_tenant()?.as_str();
        let input: CreateEmployee = validate(&data, employees_schema::ERROR_MESSAGE)?;
        let emp_id = input.emp_id.trim();
        ensure_emp_id_free(self.state.store.as_ref(), tenant_id, emp_id).await?;

        let row = json!({
            "tenant_id": tenant_id,
            "name": input.name.trim(),
            "mobile": input.mobile.as_deref().map(str::trim),
            "emp_id": emp_id,
            "password_hash": self.hash(&input.password)?,
            "role": input.role,
            "status": "active",
            "team_id": null,
            "created_by": params.principal.as_ref().map(|p| p.id.clone()),
        });
        let employee: Employee = from_row(self.state.store.insert_one(Table::Employees, row).await?)?;

        tracing::info!(tenant = tenant_id, emp_id = %employee.emp_id, role = employee.role.as_str(), "employee created");
        to_value(&employee)
    }

    async fn patch(&self, ctx: &TenantContext, id: Option<&str>, data: Value, _params: ShaktiParams) -> Result<Value> {
        let tenant_id = ctx.require_tenant()?.as_str();
        let id = id.ok_or_else(|| ShaktiError::bad_request("Employee id is required").into_anyhow())?;
        let input: PatchEmployee = validate(&data, employees_schema::ERROR_MESSAGE)?;
        let current = load_employee(self.state.store.as_ref(), tenant_id, id).await?;

        let mut patch = Map::new();
        if let Some(name) = &input.name {
            patch.insert("name".into(), json!(name.trim()));
        }
        if let Some(mobile) = &input.mobile {
            patch.insert("mobile".into(), json!(mobile.trim()));
        }
        if let Some(role) = input.role {
            patch.insert("role".into(), json!(role));
        }
        if let Some(status) = input.status {
            patch.insert("status".into(), json!(status));
        }
        if let Some(password) = &input.password {
            patch.insert("password_hash".into(), json!(self.hash(password)?));
        }
        if patch.is_empty() {
            return Err(ShaktiError::bad_request("Nothing to update").into_anyhow());
        }

        let role = input.role.unwrap_or(current.role);
        let status = input.status.unwrap_or(current.status);
        if role != current.role {
            self.ensure_leads_no_team(tenant_id, &current).await?;
        }
        if current.is_active_telecaller() && (role != Role::Telecaller || status != EmployeeStatus::Active) {
            let released_cases = self.release_open_cases(tenant_id, id).await?;
            tracing::info!(tenant = tenant_id, employee = id, released_cases, "telecaller stood down");
        }
        if current.role == Role::Telecaller && role != Role::Telecaller {
            patch.insert("team_id".into(), Value::Null);
        }

        let updated: Vec<Employee> = from_rows(
            self.state
                .store
                .update(&Query::tenant(Table::Employees, tenant_id).eq("id", id), Value::Object(patch))
                .await?,
        )?;
        match updated.first() {
            Some(employee) => to_value(employee),
            None => Err(not_found("Employee", id)),
        }
    }

    async fn remove(&self, ctx: &TenantContext, id: Option<&str>, _params: ShaktiParams) -> Result<Value> {
        let tenant_id = ctx.require_tenant()?.as_str();
        let id = id.ok_or_else(|| ShaktiError::bad_request("Employee id is required").into_anyhow())?;
        to_value(&self.remove_one(tenant_id, id).await?)
    }

    async fn custom(
        &self,
        ctx: &TenantContext,
        method: &'static str,
        data: Option<Value>,
        _params: ShaktiParams,
    ) -> Result<Value> {
        let tenant_id = ctx.require_tenant()?.as_str();
        match method {
            BULK_DELETE => self.bulk_delete(tenant_id, require_data(data, method)?).await,
            RESET_PASSWORD => self.reset_password(tenant_id, require_data(data, method)?).await,
            other => Err(ShaktiError::method_not_allowed(format!("Unknown method `{other}`")).into_anyhow()),
        }
    }
}
