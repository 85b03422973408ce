use serde_json::Value;
use shakti_auth::Role;
use shakti_core::{ServiceCapabilities, ServiceMethodKind, ShaktiApp};

use crate::services::{gate, ShaktiParams, ShaktiState};

pub const CHECK_SUBDOMAIN: &str = "check-subdomain";

pub fn capabilities() -> ServiceCapabilities {
    ServiceCapabilities::standard_crud().with_custom(&[CHECK_SUBDOMAIN])
}

pub fn register_hooks(app: &ShaktiApp<Value, ShaktiParams>, state: &ShaktiState) -> anyhow::Result<()> {
    use ServiceMethodKind::*;
    gate(
        app,
        state,
        "tenants",
        &[
            (Find, Role::SuperAdmin),
            (Get, Role::SuperAdmin),
            (Create, Role::SuperAdmin),
            (Patch, Role::SuperAdmin),
            (Remove, Role::SuperAdmin),
            (Custom(CHECK_SUBDOMAIN), Role::SuperAdmin),
        ],
    )
}
