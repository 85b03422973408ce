use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use shakti_auth::{Principal, Role};
use shakti_core::{ServiceCapabilities, ShaktiError, ShaktiService, TenantContext};

use super::reports_shared::{self, COMPANY_OVERVIEW, TEAM_DASHBOARD, TELECALLER_DASHBOARD};
use crate::models::{CallLog, CaseStatus, CustomerCase, Employee};
use crate::services::employees::employees_shared::load_employee;
use crate::services::products::products_shared::product_names;
use crate::services::teams::teams_shared::{incharge_scope, team_ids_of};
use crate::services::{ShaktiParams, ShaktiState};
use crate::store::{Query, Table};
use crate::utils::rows::{from_rows, str_field};

/// Read-only dashboards computed from cases, call logs and staff.
pub struct ReportsService {
    state: Arc<ShaktiState>,
}

fn status_counts(cases: &[CustomerCase]) -> HashMap<CaseStatus, usize> {
    let mut counts = HashMap::new();
    for case in cases {
        *counts.entry(case.status).or_default() += 1;
    }
    counts
}

impl ReportsService {
    pub fn new(state: Arc<ShaktiState>) -> Self {
        Self { state }
    }

    async fn cases(&self, query: Query) -> Result<Vec<CustomerCase>> {
        from_rows(self.state.store.select(&query).await?)
    }

    /// Whose dashboard `caller` asked for. Telecallers only ever get their
    /// own; incharges may look at members of their teams.
    async fn dashboard_owner(&self, tenant_id: &str, data: Option<&Value>, caller: &Principal) -> Result<String> {
        let requested = match data.and_then(|d| str_field(d, "telecaller_id")) {
            Some(id) if caller.role != Role::Telecaller && id != caller.id => id,
            _ => return Ok(caller.id.clone()),
        };

        let store = self.state.store.as_ref();
        let telecaller = load_employee(store, tenant_id, requested).await?;
        if caller.role == Role::TeamIncharge {
            let teams = team_ids_of(store, tenant_id, &caller.id).await?;
            if !telecaller.team_id.as_ref().is_some_and(|t| teams.contains(t)) {
                return Err(ShaktiError::forbidden("You can only view telecallers of your own teams").into_anyhow());
            }
        }
        Ok(telecaller.id)
    }

    async fn telecaller_dashboard(&self, tenant_id: &str, data: Option<Value>, params: &ShaktiParams) -> Result<Value> {
        let caller = params.require_principal()?;
        let telecaller_id = self.dashboard_owner(tenant_id, data.as_ref(), caller).await?;

        let store = self.state.store.as_ref();
        let cases = self
            .cases(Query::tenant(Table::CustomerCases, tenant_id).eq("telecaller_id", telecaller_id.as_str()))
            .await?;
        let own_logs: Vec<CallLog> = from_rows(
            store
                .select(&Query::tenant(Table::CaseCallLogs, tenant_id).eq("employee_id", telecaller_id.as_str()))
                .await?,
        )?;

        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        let todays: Vec<&CallLog> = own_logs
            .iter()
            .filter(|l| l.created_at.as_deref().is_some_and(|t| t.starts_with(&today)))
            .collect();
        let recovery_today = todays.iter().fold(0.0_f64, |sum, l| sum + l.amount());

        let open_ids: Vec<&str> = cases.iter().filter(|c| c.status.is_open()).map(|c| c.id.as_str()).collect();
        let pending_followups = if open_ids.is_empty() {
            0
        } else {
            let case_logs: Vec<CallLog> = from_rows(
                store
                    .select(
                        &Query::tenant(Table::CaseCallLogs, tenant_id)
                            .is_in("case_id", open_ids.iter().copied())
                            .newest_first(),
                    )
                    .await?,
            )?;
            // newest log of each case, whoever made the call
            let mut latest: HashMap<&str, &CallLog> = HashMap::new();
            for log in &case_logs {
                latest.entry(log.case_id.as_str()).or_insert(log);
            }
            latest
                .values()
                .filter(|log| {
                    log.ptp_date
                        .as_deref()
                        .is_some_and(|ptp| !ptp.is_empty() && ptp <= today.as_str())
                })
                .count()
        };

        let assigned = cases
            .iter()
            .filter(|c| matches!(c.status, CaseStatus::Assigned | CaseStatus::InProgress))
            .count();

        Ok(json!({
            "assignedCases": assigned,
            "callsToday": todays.len(),
            "recoveryToday": recovery_today,
            "pendingFollowups": pending_followups,
        }))
    }

    async fn team_dashboard(&self, tenant_id: &str, params: &ShaktiParams) -> Result<Value> {
        let store = self.state.store.as_ref();
        let team_ids: Vec<String> = match incharge_scope(params.principal.as_ref()) {
            Some(incharge) => team_ids_of(store, tenant_id, incharge).await?,
            None => store
                .select(&Query::tenant(Table::Teams, tenant_id))
                .await?
                .iter()
                .filter_map(|t| str_field(t, "id").map(str::to_string))
                .collect(),
        };

        let telecallers: Vec<Employee> = from_rows(
            store
                .select(
                    &Query::tenant(Table::Employees, tenant_id)
                        .eq("role", Role::Telecaller.as_str())
                        .is_in("team_id", team_ids.iter().cloned()),
                )
                .await?,
        )?;
        let cases = self
            .cases(Query::tenant(Table::CustomerCases, tenant_id).is_in("team_id", team_ids.iter().cloned()))
            .await?;
        let counts = status_counts(&cases);
        let count = |s: CaseStatus| counts.get(&s).copied().unwrap_or(0);

        Ok(json!({
            "totalTeams": team_ids.len(),
            "totalTelecallers": telecallers.len(),
            "totalCases": cases.len(),
            "activeCases": count(CaseStatus::Assigned) + count(CaseStatus::InProgress),
            "resolvedCases": count(CaseStatus::Resolved) + count(CaseStatus::Closed),
            "pendingCases": count(CaseStatus::New),
        }))
    }

    async fn company_overview(&self, tenant_id: &str) -> Result<Value> {
        let store = self.state.store.as_ref();
        let employees: Vec<Employee> = from_rows(store.select(&Query::tenant(Table::Employees, tenant_id)).await?)?;
        let teams = store.count(&Query::tenant(Table::Teams, tenant_id)).await?;
        let products = product_names(store, tenant_id).await?;
        let cases = self.cases(Query::tenant(Table::CustomerCases, tenant_id)).await?;
        let counts = status_counts(&cases);
        let count = |s: CaseStatus| counts.get(&s).copied().unwrap_or(0);
        let by_role = |r: Role| employees.iter().filter(|e| e.role == r).count();

        Ok(json!({
            "employees": {
                "total": employees.len(),
                "active": employees.iter().filter(|e| e.is_active()).count(),
                "teamIncharges": by_role(Role::TeamIncharge),
                "telecallers": by_role(Role::Telecaller),
            },
            "teams": teams,
            "products": products.len(),
            "cases": {
                "total": cases.len(),
                "new": count(CaseStatus::New),
                "assigned": count(CaseStatus::Assigned),
                "inProgress": count(CaseStatus::InProgress),
                "resolved": count(CaseStatus::Resolved),
                "closed": count(CaseStatus::Closed),
                "unassigned": cases.iter().filter(|c| c.telecaller_id.is_none()).count(),
            },
        }))
    }
}

#[async_trait]
impl ShaktiService<Value, ShaktiParams> for ReportsService {
    fn capabilities(&self) -> ServiceCapabilities {
        reports_shared::capabilities()
    }

    async fn custom(
        &self,
        ctx: &TenantContext,
        method: &'static str,
        data: Option<Value>,
        params: ShaktiParams,
    ) -> Result<Value> {
        let tenant_id = ctx.require_tenant()?.as_str();
        match method {
            TELECALLER_DASHBOARD => self.telecaller_dashboard(tenant_id, data, &params).await,
            TEAM_DASHBOARD => self.team_dashboard(tenant_id, &params).await,
            COMPANY_OVERVIEW => self.company_overview(tenant_id).await,
            other => Err(ShaktiError::method_not_allowed(format!("Unknown method `{other}`")).into_anyhow()),
        }
    }
}
