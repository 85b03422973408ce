use serde_json::Value;
use shakti_auth::Role;
use shakti_core::{ServiceCapabilities, ServiceMethodKind, ShaktiApp};

use crate::services::{gate, ShaktiParams, ShaktiState};
use crate::store::{Query, Store, Table};

pub fn capabilities() -> ServiceCapabilities {
    use ServiceMethodKind::*;
    ServiceCapabilities::from_methods(vec![Find, Create, Patch, Remove])
}

pub fn register_hooks(app: &ShaktiApp<Value, ShaktiParams>, state: &ShaktiState) -> anyhow::Result<()> {
    use ServiceMethodKind::*;
    gate(
        app,
        state,
        "products",
        &[
            (Find, Role::TeamIncharge),
            (Create, Role::CompanyAdmin),
            (Patch, Role::CompanyAdmin),
            (Remove, Role::CompanyAdmin),
        ],
    )
}

/// Distinct product names of the tenant, sorted.
pub async fn product_names(store: &dyn Store, tenant_id: &str) -> anyhow::Result<Vec<String>> {
    let rows = store
        .select(&Query::tenant(Table::ColumnConfigurations, tenant_id))
        .await?;
    let mut names: Vec<String> = rows
        .iter()
        .filter_map(|r| r.get("product_name").and_then(Value::as_str))
        .map(str::to_string)
        .collect();
    names.sort();
    names.dedup();
    Ok(names)
}

pub async fn product_exists(store: &dyn Store, tenant_id: &str, name: &str) -> anyhow::Result<bool> {
    let query = Query::tenant(Table::ColumnConfigurations, tenant_id).eq("product_name", name);
    Ok(store.select_one(&query).await?.is_some())
}
