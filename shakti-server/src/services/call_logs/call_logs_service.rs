use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use shakti_core::{ServiceCapabilities, ShaktiError, ShaktiService, TenantContext};

use super::call_logs_schema::{self, CreateCallLog};
use super::call_logs_shared;
use crate::models::{CaseStatus, CustomerCase};
use crate::services::cases::cases_shared::CaseScope;
use crate::services::{ShaktiParams, ShaktiState};
use crate::store::{Query, Table};
use crate::utils::rows::{from_row, not_found};
use crate::utils::validator::validate;

/// Append-only call history of cases.
pub struct CallLogsService {
    state: Arc<ShaktiState>,
}

impl CallLogsService {
    pub fn new(state: Arc<ShaktiState>) -> Self {
        Self { state }
    }

    async fn case_in_scope(&self, tenant_id: &str, case_id: &str, params: &ShaktiParams) -> Result<CustomerCase> {
        let store = self.state.store.as_ref();
        let row = store
            .select_one(&Query::tenant(Table::CustomerCases, tenant_id).eq("id", case_id))
            .await?
            .ok_or_else(|| not_found("Case", case_id))?;
        let case: CustomerCase = from_row(row)?;
        CaseScope::of(store, tenant_id, params.principal.as_ref())
            .await?
            .check(&case)?;
        Ok(case)
    }
}

#[async_trait]
impl ShaktiService<Value, ShaktiParams> for CallLogsService {
    fn capabilities(&self) -> ServiceCapabilities {
        call_logs_shared::capabilities()
    }

    async fn find(&self, ctx: &TenantContext, params: ShaktiParams) -> Result<Vec<Value>> {
        let tenant_id = ctx.require_tenant()?.as_str();
        let case_id = params
            .query_str("case_id")
            .ok_or_else(|| ShaktiError::bad_request("`case_id` is required").into_anyhow())?;
        self.case_in_scope(tenant_id, case_id, &params).await?;

        self.state
            .store
            .select(
                &Query::tenant(Table::CaseCallLogs, tenant_id)
                    .eq("case_id", case_id)
                    .newest_first(),
            )
            .await
    }

    async fn create(&self, ctx: &TenantContext, data: Value, params: ShaktiParams) -> Result<Value> {
        let tenant_id = ctx.require_tenant()?.as_str();
        let input: CreateCallLog = validate(&data, call_logs_schema::ERROR_MESSAGE)?;
        let caller = params.require_principal()?;
        let case = self.case_in_scope(tenant_id, input.case_id.trim(), &params).await?;

        let row = json!({
            "tenant_id": tenant_id,
            "case_id": case.id,
            "employee_id": caller.id,
            "call_status": input.call_status.trim(),
            "ptp_date": input.ptp_date.as_deref().map(str::trim),
            "call_notes": input.call_notes,
            "call_duration": input.call_duration,
            "call_result": input.call_result,
            "amount_collected": input.amount_collected,
        });
        let log = self.state.store.insert_one(Table::CaseCallLogs, row).await?;

        // first call on an assigned case starts the work
        if case.status == CaseStatus::Assigned {
            self.state
                .store
                .update(
                    &Query::tenant(Table::CustomerCases, tenant_id)
                        .eq("id", case.id.as_str())
                        .eq("status", CaseStatus::Assigned.as_str()),
                    json!({"status": CaseStatus::InProgress}),
                )
                .await?;
        }

        tracing::info!(tenant = tenant_id, case = %case.id, employee = %caller.id, "call logged");
        Ok(log)
    }
}
