use serde_json::Value;
use shakti_auth::{Principal, Role};
use shakti_core::{ServiceCapabilities, ServiceMethodKind, ShaktiApp};

use crate::services::{gate, ShaktiParams, ShaktiState};
use crate::store::{Query, Store, Table};

pub const TOGGLE_STATUS: &str = "toggle-status";
pub const AVAILABLE_TELECALLERS: &str = "available-telecallers";
pub const TELECALLERS: &str = "telecallers";
pub const INCHARGES: &str = "incharges";

pub fn capabilities() -> ServiceCapabilities {
    ServiceCapabilities::standard_crud().with_custom(&[TOGGLE_STATUS, AVAILABLE_TELECALLERS, TELECALLERS, INCHARGES])
}

pub fn register_hooks(app: &ShaktiApp<Value, ShaktiParams>, state: &ShaktiState) -> anyhow::Result<()> {
    use ServiceMethodKind::*;
    gate(
        app,
        state,
        "teams",
        &[
            (Find, Role::TeamIncharge),
            (Get, Role::TeamIncharge),
            (Custom(TELECALLERS), Role::TeamIncharge),
            (Create, Role::CompanyAdmin),
            (Patch, Role::CompanyAdmin),
            (Remove, Role::CompanyAdmin),
            (Custom(TOGGLE_STATUS), Role::CompanyAdmin),
            (Custom(AVAILABLE_TELECALLERS), Role::CompanyAdmin),
            (Custom(INCHARGES), Role::CompanyAdmin),
        ],
    )
}

/// The incharge whose teams bound what the caller sees; `None` for admins
/// and internal calls.
pub fn incharge_scope(principal: Option<&Principal>) -> Option<&str> {
    principal
        .filter(|p| p.role == Role::TeamIncharge)
        .map(|p| p.id.as_str())
}

/// Ids of the teams led by `incharge_id`.
pub async fn team_ids_of(store: &dyn Store, tenant_id: &str, incharge_id: &str) -> anyhow::Result<Vec<String>> {
    let rows = store
        .select(&Query::tenant(Table::Teams, tenant_id).eq("team_incharge_id", incharge_id))
        .await?;
    Ok(rows
        .iter()
        .filter_map(|r| r.get("id").and_then(Value::as_str))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal {
            id: "e1".into(),
            role,
            tenant_id: Some("t1".into()),
            username: "E1".into(),
            name: "E".into(),
            emp_id: Some("E1".into()),
        }
    }

    #[test]
    fn only_incharges_are_scoped() {
        assert_eq!(incharge_scope(Some(&principal(Role::TeamIncharge))), Some("e1"));
        assert_eq!(incharge_scope(Some(&principal(Role::CompanyAdmin))), None);
        assert_eq!(incharge_scope(None), None);
    }
}
