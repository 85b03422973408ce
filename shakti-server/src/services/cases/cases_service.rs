use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Map, Value};
use shakti_core::{ServiceCapabilities, ShaktiError, ShaktiService, TenantContext};

use super::cases_schema::{
    self, AssignCases, CaseStats, ExportCases, PatchCase, ReassignCases, UnassignCases, UploadCases,
};
use super::cases_shared::{self, parse_dpd_range, CaseScope, ASSIGN, EXPORT, REASSIGN, STATS, UNASSIGN, UPLOAD};
use super::cases_upload::parse_rows;
use crate::models::{CaseStatus, CustomerCase, Team};
use crate::services::columns::columns_shared::product_columns;
use crate::services::employees::employees_shared::{active_telecaller, telecallers_by_emp_id};
use crate::services::{ShaktiParams, ShaktiState};
use crate::store::{Filter, Query, Table};
use crate::utils::rows::{from_row, from_rows, not_found, to_value};
use crate::utils::validator::{require_data, validate};

/// Rows per insert request during an upload.
const UPLOAD_BATCH: usize = 100;

pub struct CasesService {
    state: Arc<ShaktiState>,
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn day_bound(raw: &str, end_of_day: bool) -> Result<String> {
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ShaktiError::bad_request(format!("Invalid date `{raw}` (expected YYYY-MM-DD)")).into_anyhow())?;
    let time = if end_of_day { "23:59:59.999" } else { "00:00:00.000" };
    Ok(format!("{}T{time}Z", date.format("%Y-%m-%d")))
}

impl CasesService {
    pub fn new(state: Arc<ShaktiState>) -> Self {
        Self { state }
    }

    async fn scope(&self, tenant_id: &str, params: &ShaktiParams) -> Result<CaseScope> {
        CaseScope::of(self.state.store.as_ref(), tenant_id, params.principal.as_ref()).await
    }

    async fn load(&self, tenant_id: &str, id: &str) -> Result<CustomerCase> {
        let row = self
            .state
            .store
            .select_one(&Query::tenant(Table::CustomerCases, tenant_id).eq("id", id))
            .await?
            .ok_or_else(|| not_found("Case", id))?;
        from_row(row)
    }

    async fn load_scoped(&self, tenant_id: &str, id: &str, scope: &CaseScope) -> Result<CustomerCase> {
        let case = self.load(tenant_id, id).await?;
        scope.check(&case)?;
        Ok(case)
    }

    async fn update_case(&self, tenant_id: &str, id: &str, patch: Value) -> Result<Value> {
        self.state
            .store
            .update(&Query::tenant(Table::CustomerCases, tenant_id).eq("id", id), patch)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| not_found("Case", id))
    }

    fn filtered_query(&self, tenant_id: &str, scope: &CaseScope, params: &ShaktiParams) -> Result<Query> {
        let mut query = scope.apply(Query::tenant(Table::CustomerCases, tenant_id)).newest_first();

        if let Some(team_id) = params.query_str("team_id") {
            query = query.eq("team_id", team_id);
        }
        if let Some(product) = params.query_str("product") {
            query = query.eq("product_name", product);
        }
        if !scope.is_telecaller() {
            if let Some(telecaller) = params.query_str("telecaller_id") {
                query = query.eq("telecaller_id", telecaller);
            }
            if params.query_bool("unassigned") == Some(true) {
                query = query.is_null("telecaller_id");
            }
        }
        if let Some(status) = params.query_str("status") {
            let status: CaseStatus = status
                .parse()
                .map_err(|e: String| ShaktiError::bad_request(e).into_anyhow())?;
            query = query.eq("status", status.as_str());
        }
        if let Some(from) = params.query_str("date_from") {
            query = query.gte("created_at", day_bound(from, false)?);
        }
        if let Some(to) = params.query_str("date_to") {
            query = query.lte("created_at", day_bound(to, true)?);
        }
        if let Some(search) = params.query_str("search") {
            let pattern = format!("%{}%", search.replace('%', ""));
            query = query.or(vec![
                Filter::ILike("case_data->>customerName".into(), pattern.clone()),
                Filter::ILike("case_data->>loanId".into(), pattern.clone()),
                Filter::ILike("case_data->>mobileNo".into(), pattern),
            ]);
        }
        Ok(query)
    }

    async fn upload(&self, tenant_id: &str, data: Value, params: &ShaktiParams) -> Result<Value> {
        let input: UploadCases = validate(&data, cases_schema::UPLOAD_ERROR_MESSAGE)?;
        let store = self.state.store.as_ref();
        let scope = self.scope(tenant_id, params).await?;

        let team_row = store
            .select_one(&Query::tenant(Table::Teams, tenant_id).eq("id", input.team_id.trim()))
            .await?
            .ok_or_else(|| not_found("Team", &input.team_id))?;
        let team: Team = from_row(team_row)?;
        if let CaseScope::Teams(ids) = &scope {
            if !ids.contains(&team.id) {
                return Err(ShaktiError::forbidden("You can only upload cases to your own teams").into_anyhow());
            }
        }

        let max_rows = self.state.settings.max_upload_rows;
        if input.rows.len() > max_rows {
            return Err(ShaktiError::unprocessable(format!(
                "Too many rows: {} (at most {max_rows} per upload)",
                input.rows.len()
            ))
            .into_anyhow());
        }

        let product = input.product_name.trim();
        let columns = product_columns(store, tenant_id, product, false).await?;
        if columns.is_empty() {
            return Err(not_found("Product", product));
        }
        let parsed = parse_rows(&input.rows, &columns)?;
        let telecallers = telecallers_by_emp_id(store, tenant_id).await?;
        let uploaded_by = params.principal.as_ref().map(|p| p.id.clone());

        let mut auto_assigned = 0usize;
        let mut unassigned = 0usize;
        let mut total_uploaded = 0usize;
        let mut errors = Vec::new();

        for batch in parsed.chunks(UPLOAD_BATCH) {
            let mut assigned_here = 0usize;
            let rows: Vec<Value> = batch
                .iter()
                .map(|row| {
                    let telecaller = telecallers.get(&row.emp_id.to_uppercase());
                    let status = match telecaller {
                        Some(_) => {
                            assigned_here += 1;
                            CaseStatus::Assigned
                        }
                        None => CaseStatus::New,
                    };
                    json!({
                        "tenant_id": tenant_id,
                        "team_id": team.id,
                        "product_name": product,
                        "telecaller_id": telecaller.map(|t| t.id.clone()),
                        "case_data": row.case_data,
                        "status": status,
                        "priority": "medium",
                        "uploaded_by": uploaded_by,
                        "assigned_by": telecaller.and(uploaded_by.clone()),
                    })
                })
                .collect();

            match store.insert(Table::CustomerCases, rows).await {
                Ok(inserted) => {
                    total_uploaded += inserted.len();
                    auto_assigned += assigned_here;
                    unassigned += batch.len() - assigned_here;
                }
                Err(e) => {
                    let message = ShaktiError::normalize(e).message;
                    tracing::warn!(tenant = tenant_id, rows = batch.len(), error = %message, "case batch failed");
                    errors.extend(batch.iter().map(|row| json!({"row": row.index + 1, "error": message})));
                }
            }
        }

        tracing::info!(
            tenant = tenant_id,
            team = %team.id,
            product,
            total_uploaded,
            auto_assigned,
            unassigned,
            "cases uploaded"
        );
        Ok(json!({
            "totalUploaded": total_uploaded,
            "autoAssigned": auto_assigned,
            "unassigned": unassigned,
            "errors": errors,
        }))
    }

    /// Applies `patch` to each case in scope, collecting per-case failures.
    async fn apply_to_cases(
        &self,
        tenant_id: &str,
        case_ids: &[String],
        scope: &CaseScope,
        patch: Value,
        action: &str,
    ) -> Result<Value> {
        let mut success = 0usize;
        let mut details = Vec::new();

        for id in case_ids {
            let outcome = match self.load_scoped(tenant_id, id, scope).await {
                Ok(_) => self.update_case(tenant_id, id, patch.clone()).await.map(|_| ()),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(()) => success += 1,
                Err(e) => details.push(json!({
                    "caseId": short_id(id),
                    "error": ShaktiError::normalize(e).message,
                })),
            }
        }

        tracing::info!(tenant = tenant_id, action, total = case_ids.len(), success, "cases updated");
        Ok(json!({
            "total": case_ids.len(),
            "success": success,
            "errors": details.len(),
            "errorDetails": details,
            "action": action,
        }))
    }

    async fn assign(&self, tenant_id: &str, data: Value, params: &ShaktiParams) -> Result<Value> {
        let input: AssignCases = validate(&data, cases_schema::ERROR_MESSAGE)?;
        let telecaller = active_telecaller(self.state.store.as_ref(), tenant_id, input.telecaller_id.trim()).await?;
        let scope = self.scope(tenant_id, params).await?;
        let patch = json!({
            "telecaller_id": telecaller.id,
            "status": CaseStatus::Assigned,
            "assigned_by": params.principal.as_ref().map(|p| p.id.clone()),
        });
        self.apply_to_cases(tenant_id, &input.case_ids, &scope, patch, ASSIGN).await
    }

    async fn unassign(&self, tenant_id: &str, data: Value, params: &ShaktiParams) -> Result<Value> {
        let input: UnassignCases = validate(&data, cases_schema::ERROR_MESSAGE)?;
        let scope = self.scope(tenant_id, params).await?;
        let patch = json!({"telecaller_id": null, "status": CaseStatus::New, "assigned_by": null});
        self.apply_to_cases(tenant_id, &input.case_ids, &scope, patch, UNASSIGN).await
    }

    /// Moves open cases matching the criteria from one telecaller to another.
    async fn reassign(&self, tenant_id: &str, data: Value, params: &ShaktiParams) -> Result<Value> {
        let input: ReassignCases = validate(&data, cases_schema::ERROR_MESSAGE)?;
        let from = input.from_telecaller.trim();
        let to = input.to_telecaller.trim();
        if from == to {
            return Err(ShaktiError::bad_request("Cannot reassign cases to the same telecaller").into_anyhow());
        }
        let store = self.state.store.as_ref();
        let target = active_telecaller(store, tenant_id, to).await?;
        let dpd = input.dpd_range.as_deref().map(parse_dpd_range).transpose()?;

        let scope = self.scope(tenant_id, params).await?;
        let mut query = scope
            .apply(Query::tenant(Table::CustomerCases, tenant_id))
            .eq("telecaller_id", from)
            .is_in("status", [CaseStatus::Assigned.as_str(), CaseStatus::InProgress.as_str()]);
        if let Some(product) = input.product.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            query = query.eq("product_name", product);
        }

        let cases: Vec<CustomerCase> = from_rows(store.select(&query).await?)?;
        let matching: Vec<String> = cases
            .into_iter()
            .filter(|c| match dpd {
                Some((lo, hi)) => c.dpd().is_some_and(|d| d >= lo && hi.map_or(true, |hi| d <= hi)),
                None => true,
            })
            .filter(|c| {
                let amount = c.outstanding_amount();
                let above = input.min_amount.map_or(true, |min| amount.is_some_and(|a| a >= min));
                let below = input.max_amount.map_or(true, |max| amount.is_some_and(|a| a <= max));
                above && below
            })
            .map(|c| c.id)
            .collect();

        if input.preview {
            return Ok(json!({"preview": true, "matched": matching.len()}));
        }

        let moved = if matching.is_empty() {
            0
        } else {
            store
                .update(
                    &Query::tenant(Table::CustomerCases, tenant_id).is_in("id", matching.iter().cloned()),
                    json!({
                        "telecaller_id": target.id,
                        "status": CaseStatus::Assigned,
                        "assigned_by": params.principal.as_ref().map(|p| p.id.clone()),
                    }),
                )
                .await?
                .len()
        };

        tracing::info!(tenant = tenant_id, from, to, moved, "cases reassigned");
        Ok(json!({"preview": false, "matched": matching.len(), "moved": moved}))
    }

    async fn stats(&self, tenant_id: &str, data: Option<Value>, params: &ShaktiParams) -> Result<Value> {
        let input: CaseStats = match data {
            Some(d) => validate(&d, cases_schema::ERROR_MESSAGE)?,
            None => CaseStats::default(),
        };
        let scope = self.scope(tenant_id, params).await?;
        let mut query = scope.apply(Query::tenant(Table::CustomerCases, tenant_id));
        if let (false, Some(id)) = (scope.is_telecaller(), input.telecaller_id.as_deref()) {
            query = query.eq("telecaller_id", id);
        }

        let cases: Vec<CustomerCase> = from_rows(self.state.store.select(&query).await?)?;
        let mut counts: HashMap<CaseStatus, usize> = HashMap::new();
        for case in &cases {
            *counts.entry(case.status).or_default() += 1;
        }
        let count = |s: CaseStatus| counts.get(&s).copied().unwrap_or(0);

        Ok(json!({
            "total": cases.len(),
            "new": count(CaseStatus::New),
            "assigned": count(CaseStatus::Assigned),
            "inProgress": count(CaseStatus::InProgress),
            "resolved": count(CaseStatus::Resolved),
            "closed": count(CaseStatus::Closed),
        }))
    }

    async fn export(&self, tenant_id: &str, data: Value, params: &ShaktiParams) -> Result<Value> {
        let input: ExportCases = validate(&data, cases_schema::ERROR_MESSAGE)?;
        let product = input.product.trim();
        let store = self.state.store.as_ref();

        let columns = product_columns(store, tenant_id, product, true).await?;
        let scope = self.scope(tenant_id, params).await?;
        let mut query = scope
            .apply(Query::tenant(Table::CustomerCases, tenant_id))
            .eq("product_name", product)
            .newest_first();
        if let Some(team_id) = input.team_id.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            query = query.eq("team_id", team_id);
        }
        let cases: Vec<CustomerCase> = from_rows(store.select(&query).await?)?;

        let headers: Vec<&str> = columns.iter().map(|c| c.display_name.as_str()).collect();
        let rows: Vec<Vec<String>> = cases
            .iter()
            .map(|case| {
                columns
                    .iter()
                    .map(|c| case.field(&c.column_name).unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(json!({"product": product, "headers": headers, "rows": rows}))
    }
}

#[async_trait]
impl ShaktiService<Value, ShaktiParams> for CasesService {
    fn capabilities(&self) -> ServiceCapabilities {
        cases_shared::capabilities()
    }

    async fn find(&self, ctx: &TenantContext, params: ShaktiParams) -> Result<Vec<Value>> {
        let tenant_id = ctx.require_tenant()?.as_str();
        let scope = self.scope(tenant_id, &params).await?;
        let query = self.filtered_query(tenant_id, &scope, &params)?;
        self.state.store.select(&query).await
    }

    async fn get(&self, ctx: &TenantContext, id: &str, params: ShaktiParams) -> Result<Value> {
        let tenant_id = ctx.require_tenant()?.as_str();
        let scope = self.scope(tenant_id, &params).await?;
        let case = self.load(tenant_id, id).await?;
        scope.check(&case)?;
        to_value(&case)
    }

    async fn patch(&self, ctx: &TenantContext, id: Option<&str>, data: Value, params: ShaktiParams) -> Result<Value> {
        let tenant_id = ctx.require_tenant()?.as_str();
        let id = id.ok_or_else(|| ShaktiError::bad_request("Case id is required").into_anyhow())?;
        let input: PatchCase = validate(&data, cases_schema::ERROR_MESSAGE)?;
        let scope = self.scope(tenant_id, &params).await?;
        let case = self.load_scoped(tenant_id, id, &scope).await?;

        if scope.is_telecaller() && input.case_data.is_some() {
            return Err(ShaktiError::forbidden("Telecallers may only change status, priority and remarks").into_anyhow());
        }

        let mut patch = Map::new();
        if let Some(status) = input.status {
            if matches!(status, CaseStatus::New | CaseStatus::Assigned) && status != case.status {
                return Err(ShaktiError::unprocessable(cases_schema::ERROR_MESSAGE)
                    .with_errors(json!({"status": ["Use assign or unassign to change a case's assignment"]}))
                    .into_anyhow());
            }
            if status != CaseStatus::New && case.telecaller_id.is_none() {
                return Err(ShaktiError::unprocessable(cases_schema::ERROR_MESSAGE)
                    .with_errors(json!({"status": ["Assign the case before working it"]}))
                    .into_anyhow());
            }
            patch.insert("status".into(), json!(status));
        }
        if let Some(priority) = &input.priority {
            patch.insert("priority".into(), json!(priority.trim()));
        }
        if input.remarks.is_some() || input.case_data.is_some() {
            let mut case_data = case.case_data.clone();
            if let Some(cells) = input.case_data {
                case_data.extend(cells);
            }
            if let Some(remarks) = input.remarks {
                case_data.insert("remarks".into(), Value::String(remarks));
            }
            patch.insert("case_data".into(), Value::Object(case_data));
        }
        if patch.is_empty() {
            return Err(ShaktiError::bad_request("Nothing to update").into_anyhow());
        }

        self.update_case(tenant_id, id, Value::Object(patch)).await
    }

    async fn remove(&self, ctx: &TenantContext, id: Option<&str>, params: ShaktiParams) -> Result<Value> {
        let tenant_id = ctx.require_tenant()?.as_str();
        let id = id.ok_or_else(|| ShaktiError::bad_request("Case id is required").into_anyhow())?;
        let scope = self.scope(tenant_id, &params).await?;
        let case = self.load_scoped(tenant_id, id, &scope).await?;

        let store = self.state.store.as_ref();
        store
            .delete(&Query::tenant(Table::CaseCallLogs, tenant_id).eq("case_id", id))
            .await?;
        store
            .delete(&Query::tenant(Table::CustomerCases, tenant_id).eq("id", id))
            .await?;
        to_value(&case)
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
            UPLOAD => self.upload(tenant_id, require_data(data, method)?, &params).await,
            ASSIGN => self.assign(tenant_id, require_data(data, method)?, &params).await,
            UNASSIGN => self.unassign(tenant_id, require_data(data, method)?, &params).await,
            REASSIGN => self.reassign(tenant_id, require_data(data, method)?, &params).await,
            STATS => self.stats(tenant_id, data, &params).await,
            EXPORT => self.export(tenant_id, require_data(data, method)?, &params).await,
            other => Err(ShaktiError::method_not_allowed(format!("Unknown method `{other}`")).into_anyhow()),
        }
    }
}
