use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use shakti_auth::Role;
use shakti_core::{ServiceCapabilities, ShaktiError, ShaktiService, TenantContext};

use super::teams_schema::{self, AvailableTelecallers, CreateTeam, PatchTeam, TeamRef, TeamTelecallers};
use super::teams_shared::{self, incharge_scope, team_ids_of, AVAILABLE_TELECALLERS, INCHARGES, TELECALLERS, TOGGLE_STATUS};
use crate::models::{Employee, Team};
use crate::services::employees::employees_shared::{active_telecaller, load_employee};
use crate::services::{ShaktiParams, ShaktiState};
use crate::store::{Query, Table};
use crate::utils::rows::{from_row, from_rows, not_found, to_value};
use crate::utils::validator::{require_data, validate};

pub struct TeamsService {
    state: Arc<ShaktiState>,
}

fn member(e: &Employee) -> Value {
    json!({"id": e.id, "name": e.name, "emp_id": e.emp_id, "status": e.status})
}

fn required_id(id: Option<&str>) -> Result<&str> {
    id.ok_or_else(|| ShaktiError::bad_request("Team id is required").into_anyhow())
}

impl TeamsService {
    pub fn new(state: Arc<ShaktiState>) -> Self {
        Self { state }
    }

    async fn load(&self, tenant_id: &str, id: &str) -> Result<Team> {
        let row = self
            .state
            .store
            .select_one(&Query::tenant(Table::Teams, tenant_id).eq("id", id))
            .await?
            .ok_or_else(|| not_found("Team", id))?;
        from_row(row)
    }

    /// A team the caller may see: incharges only reach their own.
    async fn visible(&self, tenant_id: &str, id: &str, params: &ShaktiParams) -> Result<Team> {
        let team = self.load(tenant_id, id).await?;
        if let Some(incharge) = incharge_scope(params.principal.as_ref()) {
            if team.team_incharge_id != incharge {
                return Err(ShaktiError::forbidden("You can only access your own teams").into_anyhow());
            }
        }
        Ok(team)
    }

    async fn ensure_incharge(&self, tenant_id: &str, id: &str) -> Result<Employee> {
        let employee = load_employee(self.state.store.as_ref(), tenant_id, id).await?;
        if employee.role != Role::TeamIncharge || !employee.is_active() {
            return Err(ShaktiError::bad_request(format!("{} is not an active team incharge", employee.name)).into_anyhow());
        }
        Ok(employee)
    }

    async fn check_members(&self, tenant_id: &str, telecaller_ids: &[String]) -> Result<()> {
        let store = self.state.store.as_ref();
        for id in telecaller_ids {
            active_telecaller(store, tenant_id, id).await?;
        }
        Ok(())
    }

    /// Makes `telecaller_ids` the exact membership of the team.
    async fn set_members(&self, tenant_id: &str, team_id: &str, telecaller_ids: &[String]) -> Result<()> {
        self.check_members(tenant_id, telecaller_ids).await?;

        let store = self.state.store.as_ref();
        store
            .update(
                &Query::tenant(Table::Employees, tenant_id).eq("team_id", team_id),
                json!({"team_id": null}),
            )
            .await?;
        if !telecaller_ids.is_empty() {
            store
                .update(
                    &Query::tenant(Table::Employees, tenant_id).is_in("id", telecaller_ids.iter().cloned()),
                    json!({"team_id": team_id}),
                )
                .await?;
        }
        Ok(())
    }

    /// Teams with their incharge, members and case count.
    async fn with_details(&self, tenant_id: &str, teams: Vec<Team>) -> Result<Vec<Value>> {
        let store = self.state.store.as_ref();
        let employees: Vec<Employee> = from_rows(store.select(&Query::tenant(Table::Employees, tenant_id)).await?)?;
        let by_id: HashMap<&str, &Employee> = employees.iter().map(|e| (e.id.as_str(), e)).collect();

        let mut case_counts: HashMap<String, usize> = HashMap::new();
        if !teams.is_empty() {
            let cases = store
                .select(&Query::tenant(Table::CustomerCases, tenant_id).is_in("team_id", teams.iter().map(|t| t.id.clone())))
                .await?;
            for case in &cases {
                if let Some(team_id) = case.get("team_id").and_then(Value::as_str) {
                    *case_counts.entry(team_id.to_string()).or_default() += 1;
                }
            }
        }

        teams
            .into_iter()
            .map(|team| -> Result<Value> {
                let incharge = by_id
                    .get(team.team_incharge_id.as_str())
                    .map(|e| json!({"id": e.id, "name": e.name, "emp_id": e.emp_id}));
                let telecallers: Vec<Value> = employees
                    .iter()
                    .filter(|e| e.role == Role::Telecaller && e.team_id.as_deref() == Some(team.id.as_str()))
                    .map(member)
                    .collect();
                let total_cases = case_counts.get(&team.id).copied().unwrap_or(0);

                let mut out = to_value(&team)?;
                out["incharge"] = incharge.unwrap_or(Value::Null);
                out["telecallers"] = Value::Array(telecallers);
                out["totalCases"] = json!(total_cases);
                Ok(out)
            })
            .collect()
    }

    async fn toggle_status(&self, tenant_id: &str, data: Value) -> Result<Value> {
        let input: TeamRef = validate(&data, teams_schema::ERROR_MESSAGE)?;
        let team = self.load(tenant_id, &input.id).await?;
        let status = team.status.toggled();
        let updated = self
            .state
            .store
            .update(
                &Query::tenant(Table::Teams, tenant_id).eq("id", team.id.as_str()),
                json!({"status": status.as_str()}),
            )
            .await?;
        tracing::info!(tenant = tenant_id, team = %team.id, status = status.as_str(), "team status toggled");
        updated.into_iter().next().ok_or_else(|| not_found("Team", &input.id))
    }

    async fn telecallers_where(&self, query: Query) -> Result<Vec<Employee>> {
        from_rows(self.state.store.select(&query.eq("role", Role::Telecaller.as_str())).await?)
    }

    /// Active telecallers in no team (or in the excluded team, which is
    /// being edited).
    async fn available_telecallers(&self, tenant_id: &str, data: Option<Value>) -> Result<Value> {
        let input: AvailableTelecallers = match data {
            Some(d) => validate(&d, teams_schema::ERROR_MESSAGE)?,
            None => AvailableTelecallers::default(),
        };
        let employees = self
            .telecallers_where(Query::tenant(Table::Employees, tenant_id).eq("status", "active"))
            .await?;
        let available: Vec<Value> = employees
            .iter()
            .filter(|e| match (&e.team_id, &input.exclude_team_id) {
                (None, _) => true,
                (Some(team), Some(excluded)) => team == excluded,
                (Some(_), None) => false,
            })
            .map(member)
            .collect();
        Ok(Value::Array(available))
    }

    async fn telecallers(&self, tenant_id: &str, data: Option<Value>, params: &ShaktiParams) -> Result<Value> {
        let input: TeamTelecallers = match data {
            Some(d) => validate(&d, teams_schema::ERROR_MESSAGE)?,
            None => TeamTelecallers::default(),
        };
        let base = Query::tenant(Table::Employees, tenant_id);

        let query = match (input.team_id, incharge_scope(params.principal.as_ref())) {
            (Some(team_id), _) => {
                self.visible(tenant_id, &team_id, params).await?;
                base.eq("team_id", team_id)
            }
            (None, Some(incharge)) => {
                let teams = team_ids_of(self.state.store.as_ref(), tenant_id, incharge).await?;
                base.is_in("team_id", teams)
            }
            (None, None) => base,
        };

        let employees = self.telecallers_where(query).await?;
        Ok(Value::Array(employees.iter().map(member).collect()))
    }

    async fn incharges(&self, tenant_id: &str) -> Result<Value> {
        let rows = self
            .state
            .store
            .select(
                &Query::tenant(Table::Employees, tenant_id)
                    .eq("role", Role::TeamIncharge.as_str())
                    .eq("status", "active"),
            )
            .await?;
        let incharges: Vec<Employee> = from_rows(rows)?;
        Ok(Value::Array(incharges.iter().map(member).collect()))
    }
}

#[async_trait]
impl ShaktiService<Value, ShaktiParams> for TeamsService {
    fn capabilities(&self) -> ServiceCapabilities {
        teams_shared::capabilities()
    }

    async fn find(&self, ctx: &TenantContext, params: ShaktiParams) -> Result<Vec<Value>> {
        let tenant_id = ctx.require_tenant()?.as_str();
        let mut query = Query::tenant(Table::Teams, tenant_id).newest_first();

        let mine = params.query_bool("mine").unwrap_or(false);
        if let Some(incharge) = incharge_scope(params.principal.as_ref()) {
            query = query.eq("team_incharge_id", incharge);
        } else if mine {
            query = query.eq("team_incharge_id", params.require_principal()?.id.as_str());
        }
        for column in ["status", "product_name"] {
            if let Some(v) = params.query_str(column) {
                query = query.eq(column, v);
            }
        }

        let teams: Vec<Team> = from_rows(self.state.store.select(&query).await?)?;
        self.with_details(tenant_id, teams).await
    }

    async fn get(&self, ctx: &TenantContext, id: &str, params: ShaktiParams) -> Result<Value> {
        let tenant_id = ctx.require_tenant()?.as_str();
        let team = self.visible(tenant_id, id, &params).await?;
        let mut detailed = self.with_details(tenant_id, vec![team]).await?;
        detailed.pop().ok_or_else(|| not_found("Team", id))
    }

    async fn create(&self, ctx: &TenantContext, data: Value, params: ShaktiParams) -> Result<Value> {
        let tenant_id = ctx.require_tenant()?.as_str();
        let input: CreateTeam = validate(&data, teams_schema::ERROR_MESSAGE)?;
        let incharge = self.ensure_incharge(tenant_id, input.team_incharge_id.trim()).await?;
        self.check_members(tenant_id, &input.telecaller_ids).await?;

        let row = json!({
            "tenant_id": tenant_id,
            "name": input.name.trim(),
            "team_incharge_id": incharge.id,
            "product_name": input.product_name.trim(),
            "status": "active",
            "created_by": params.principal.as_ref().map(|p| p.id.clone()),
        });
        let team: Team = from_row(self.state.store.insert_one(Table::Teams, row).await?)?;
        self.set_members(tenant_id, &team.id, &input.telecaller_ids).await?;

        tracing::info!(tenant = tenant_id, team = %team.id, members = input.telecaller_ids.len(), "team created");
        let mut detailed = self.with_details(tenant_id, vec![team]).await?;
        detailed.pop().ok_or_else(|| anyhow::anyhow!("created team vanished"))
    }

    async fn patch(&self, ctx: &TenantContext, id: Option<&str>, data: Value, _params: ShaktiParams) -> Result<Value> {
        let tenant_id = ctx.require_tenant()?.as_str();
        let id = required_id(id)?;
        let input: PatchTeam = validate(&data, teams_schema::ERROR_MESSAGE)?;
        self.load(tenant_id, id).await?;

        let mut patch = Map::new();
        if let Some(name) = &input.name {
            patch.insert("name".into(), json!(name.trim()));
        }
        if let Some(incharge_id) = &input.team_incharge_id {
            let incharge = self.ensure_incharge(tenant_id, incharge_id.trim()).await?;
            patch.insert("team_incharge_id".into(), json!(incharge.id));
        }
        if let Some(product) = &input.product_name {
            patch.insert("product_name".into(), json!(product.trim()));
        }
        if let Some(status) = input.status {
            patch.insert("status".into(), json!(status.as_str()));
        }
        if patch.is_empty() && input.telecaller_ids.is_none() {
            return Err(ShaktiError::bad_request("Nothing to update").into_anyhow());
        }

        if let Some(ids) = &input.telecaller_ids {
            self.set_members(tenant_id, id, ids).await?;
        }
        if !patch.is_empty() {
            self.state
                .store
                .update(&Query::tenant(Table::Teams, tenant_id).eq("id", id), Value::Object(patch))
                .await?;
        }

        let team = self.load(tenant_id, id).await?;
        let mut detailed = self.with_details(tenant_id, vec![team]).await?;
        detailed.pop().ok_or_else(|| not_found("Team", id))
    }

    async fn remove(&self, ctx: &TenantContext, id: Option<&str>, _params: ShaktiParams) -> Result<Value> {
        let tenant_id = ctx.require_tenant()?.as_str();
        let id = required_id(id)?;
        let team = self.load(tenant_id, id).await?;

        self.set_members(tenant_id, id, &[]).await?;
        self.state
            .store
            .delete(&Query::tenant(Table::Teams, tenant_id).eq("id", id))
            .await?;

        tracing::info!(tenant = tenant_id, team = id, "team removed");
        to_value(&team)
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
            TOGGLE_STATUS => {
                let data = require_data(data, method)?;
                self.toggle_status(tenant_id, data).await
            }
            AVAILABLE_TELECALLERS => self.available_telecallers(tenant_id, data).await,
            TELECALLERS => self.telecallers(tenant_id, data, &params).await,
            INCHARGES => self.incharges(tenant_id).await,
            other => Err(ShaktiError::method_not_allowed(format!("Unknown method `{other}`")).into_anyhow()),
        }
    }
}
