use serde_json::Value;
use shakti_auth::Role;
use shakti_core::{ServiceCapabilities, ServiceMethodKind, ShaktiApp};

use crate::services::{gate, ShaktiParams, ShaktiState};

pub const TELECALLER_DASHBOARD: &str = "telecaller-dashboard";
pub const TEAM_DASHBOARD: &str = "team-dashboard";
pub const COMPANY_OVERVIEW: &str = "company-overview";

pub fn capabilities() -> ServiceCapabilities {
    ServiceCapabilities::default().with_custom(&[TELECALLER_DASHBOARD, TEAM_DASHBOARD, COMPANY_OVERVIEW])
}

pub fn register_hooks(app: &ShaktiApp<Value, ShaktiParams>, state: &ShaktiState) -> anyhow::Result<()> {
    use ServiceMethodKind::Custom;
    gate(
        app,
        state,
        "reports",
        &[
            (Custom(TELECALLER_DASHBOARD), Role::Telecaller),
            (Custom(TEAM_DASHBOARD), Role::TeamIncharge),
            (Custom(COMPANY_OVERVIEW), Role::CompanyAdmin),
        ],
    )
}
