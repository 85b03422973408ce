use std::sync::Arc;

use serde_json::Value;
use shakti_auth::{Authenticate, RequireRole, Role};
use shakti_core::{ServiceMethodKind, ShaktiApp, ShaktiService};

pub mod types;
pub use types::{ShaktiParams, ShaktiState};

pub mod authentication;
pub mod call_logs;
pub mod cases;
pub mod columns;
pub mod company_admins;
pub mod employees;
pub mod products;
pub mod reports;
pub mod teams;
pub mod tenants;

pub type SharedService = Arc<dyn ShaktiService<Value, ShaktiParams>>;

/// Every service, keyed by the path it is mounted on.
pub struct ShaktiServices {
    pub all: Vec<(&'static str, SharedService)>,
}

/// Requires a valid token on every external call of `service`, and the
/// given role area per method.
pub(crate) fn gate(
    app: &ShaktiApp<Value, ShaktiParams>,
    state: &ShaktiState,
    service: &str,
    rules: &[(ServiceMethodKind, Role)],
) -> anyhow::Result<()> {
    let tokens = Arc::clone(&state.tokens);
    app.service(service)?.hooks(|h| {
        h.before_all(Arc::new(Authenticate::new(tokens)));
        for (method, area) in rules {
            h.before(*method, Arc::new(RequireRole::new(*area)));
        }
    });
    Ok(())
}

pub fn configure(app: &ShaktiApp<Value, ShaktiParams>, state: Arc<ShaktiState>) -> anyhow::Result<ShaktiServices> {
    let all: Vec<(&'static str, SharedService)> = vec![
        (
            "authentication",
            Arc::new(authentication::AuthenticationService::new(Arc::clone(&state))?),
        ),
        ("tenants", Arc::new(tenants::TenantsService::new(Arc::clone(&state)))),
        (
            "company-admins",
            Arc::new(company_admins::CompanyAdminsService::new(Arc::clone(&state))),
        ),
        ("employees", Arc::new(employees::EmployeesService::new(Arc::clone(&state)))),
        ("products", Arc::new(products::ProductsService::new(Arc::clone(&state)))),
        ("columns", Arc::new(columns::ColumnsService::new(Arc::clone(&state)))),
        ("teams", Arc::new(teams::TeamsService::new(Arc::clone(&state)))),
        ("cases", Arc::new(cases::CasesService::new(Arc::clone(&state)))),
        ("call-logs", Arc::new(call_logs::CallLogsService::new(Arc::clone(&state)))),
        ("reports", Arc::new(reports::ReportsService::new(Arc::clone(&state)))),
    ];

    for (name, svc) in &all {
        app.register_service(*name, Arc::clone(svc));
    }

    authentication::authentication_shared::register_hooks(app, &state)?;
    tenants::tenants_shared::register_hooks(app, &state)?;
    company_admins::company_admins_shared::register_hooks(app, &state)?;
    employees::employees_shared::register_hooks(app, &state)?;
    products::products_shared::register_hooks(app, &state)?;
    columns::columns_shared::register_hooks(app, &state)?;
    teams::teams_shared::register_hooks(app, &state)?;
    cases::cases_shared::register_hooks(app, &state)?;
    call_logs::call_logs_shared::register_hooks(app, &state)?;
    reports::reports_shared::register_hooks(app, &state)?;

    Ok(ShaktiServices { all })
}
