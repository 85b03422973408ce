use serde_json::Value;
use shakti_auth::Role;
use shakti_core::{ServiceCapabilities, ServiceMethodKind, ShaktiApp, ShaktiError};

use crate::models::Employee;
use crate::services::{gate, ShaktiParams, ShaktiState};
use crate::store::{Query, Store, Table};
use crate::utils::rows::{from_row, not_found};

pub const BULK_DELETE: &str = "bulk-delete";
pub const RESET_PASSWORD: &str = "reset-password";

pub fn capabilities() -> ServiceCapabilities {
    ServiceCapabilities::standard_crud().with_custom(&[BULK_DELETE, RESET_PASSWORD])
}

pub fn register_hooks(app: &ShaktiApp<Value, ShaktiParams>, state: &ShaktiState) -> anyhow::Result<()> {
    use ServiceMethodKind::*;
    gate(
        app,
        state,
        "employees",
        &[
            (Find, Role::CompanyAdmin),
            (Get, Role::CompanyAdmin),
            (Create, Role::CompanyAdmin),
            (Patch, Role::CompanyAdmin),
            (Remove, Role::CompanyAdmin),
            (Custom(BULK_DELETE), Role::CompanyAdmin),
            (Custom(RESET_PASSWORD), Role::CompanyAdmin),
        ],
    )
}

/// Company admins and employees of a tenant share one login ID space.
/// IDs differing only in case collide.
pub async fn ensure_emp_id_free(store: &dyn Store, tenant_id: &str, emp_id: &str) -> anyhow::Result<()> {
    let wanted = emp_id.trim();
    let taken = |row: &Value, column: &str| {
        row.get(column)
            .and_then(Value::as_str)
            .is_some_and(|id| id.trim().eq_ignore_ascii_case(wanted))
    };

    let admins = store.select(&Query::tenant(Table::CompanyAdmins, tenant_id)).await?;
    let employees = store.select(&Query::tenant(Table::Employees, tenant_id)).await?;
    if admins.iter().any(|r| taken(r, "employee_id")) || employees.iter().any(|r| taken(r, "emp_id")) {
        return Err(ShaktiError::conflict(format!("Employee ID {wanted} already exists")).into_anyhow());
    }
    Ok(())
}

pub async fn load_employee(store: &dyn Store, tenant_id: &str, id: &str) -> anyhow::Result<Employee> {
    let row = store
        .select_one(&Query::tenant(Table::Employees, tenant_id).eq("id", id))
        .await?
        .ok_or_else(|| not_found("Employee", id))?;
    from_row(row)
}

/// An active Telecaller of the tenant, or a 400 saying why not.
pub async fn active_telecaller(store: &dyn Store, tenant_id: &str, id: &str) -> anyhow::Result<Employee> {
    let employee = load_employee(store, tenant_id, id).await?;
    if !employee.is_active_telecaller() {
        return Err(ShaktiError::bad_request(format!("{} is not an active telecaller", employee.name)).into_anyhow());
    }
    Ok(employee)
}

/// Active Telecallers of the tenant keyed by their employee ID.
pub async fn telecallers_by_emp_id(
    store: &dyn Store,
    tenant_id: &str,
) -> anyhow::Result<std::collections::HashMap<String, Employee>> {
    let rows = store
        .select(
            &Query::tenant(Table::Employees, tenant_id)
                .eq("role", Role::Telecaller.as_str())
                .eq("status", "active"),
        )
        .await?;
    let mut out = std::collections::HashMap::new();
    for row in rows {
        let employee: Employee = from_row(row)?;
        out.insert(employee.emp_id.trim().to_uppercase(), employee);
    }
    Ok(out)
}
