//! Account sources for the two login strategies.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use shakti_auth::{AccountRecord, AccountResolver, Principal, Role};
use shakti_core::TenantContext;

use crate::models::{CompanyAdmin, EmployeeStatus, Employee, SuperAdmin};
use crate::store::{Query, Store, Table};
use crate::utils::rows::from_row;

pub struct SuperAdminAccounts {
    pub store: Arc<dyn Store>,
}

#[async_trait]
impl AccountResolver for SuperAdminAccounts {
    async fn resolve(&self, _tenant: &TenantContext, username: &str) -> Result<Option<AccountRecord>> {
        let Some(row) = self
            .store
            .select_one(&Query::new(Table::SuperAdmins).eq("username", username))
            .await?
        else {
            return Ok(None);
        };
        let admin: SuperAdmin = from_row(row)?;

        Ok(Some(AccountRecord {
            principal: Principal {
                id: admin.id,
                role: Role::SuperAdmin,
                tenant_id: None,
                name: admin.name.unwrap_or_else(|| admin.username.clone()),
                username: admin.username,
                emp_id: None,
            },
            password_hash: admin.password_hash,
            active: true,
        }))
    }
}

pub struct CompanyAdminAccounts {
    pub store: Arc<dyn Store>,
}

#[async_trait]
impl AccountResolver for CompanyAdminAccounts {
    async fn resolve(&self, tenant: &TenantContext, employee_id: &str) -> Result<Option<AccountRecord>> {
        let tenant_id = tenant.require_tenant()?;
        let Some(row) = self
            .store
            .select_one(&Query::tenant(Table::CompanyAdmins, tenant_id.as_str()).eq("employee_id", employee_id))
            .await?
        else {
            return Ok(None);
        };
        let admin: CompanyAdmin = from_row(row)?;

        Ok(Some(AccountRecord {
            active: admin.status == EmployeeStatus::Active,
            principal: Principal {
                id: admin.id,
                role: Role::CompanyAdmin,
                tenant_id: Some(admin.tenant_id),
                username: admin.employee_id.clone(),
                name: admin.name,
                emp_id: Some(admin.employee_id),
            },
            password_hash: admin.password_hash,
        }))
    }
}

pub struct EmployeeAccounts {
    pub store: Arc<dyn Store>,
}

#[async_trait]
impl AccountResolver for EmployeeAccounts {
    async fn resolve(&self, tenant: &TenantContext, emp_id: &str) -> Result<Option<AccountRecord>> {
        let tenant_id = tenant.require_tenant()?;
        let Some(row) = self
            .store
            .select_one(&Query::tenant(Table::Employees, tenant_id.as_str()).eq("emp_id", emp_id))
            .await?
        else {
            return Ok(None);
        };
        let employee: Employee = from_row(row)?;

        Ok(Some(AccountRecord {
            active: employee.is_active(),
            principal: Principal {
                id: employee.id,
                role: employee.role,
                tenant_id: Some(employee.tenant_id),
                username: employee.emp_id.clone(),
                name: employee.name,
                emp_id: Some(employee.emp_id),
            },
            password_hash: employee.password_hash,
        }))
    }
}
