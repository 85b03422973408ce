use serde_json::Value;
use shakti_auth::Role;
use shakti_core::{ServiceCapabilities, ServiceMethodKind, ShaktiApp};

use crate::services::{gate, ShaktiParams, ShaktiState};

pub fn capabilities() -> ServiceCapabilities {
    use ServiceMethodKind::*;
    ServiceCapabilities::from_methods(vec![Find, Get, Create, Remove])
}

pub fn register_hooks(app: &ShaktiApp<Value, ShaktiParams>, state: &ShaktiState) -> anyhow::Result<()> {
    use ServiceMethodKind::*;
    gate(
        app,
        state,
        "company-admins",
        &[
            (Find, Role::SuperAdmin),
            (Get, Role::SuperAdmin),
            (Create, Role::SuperAdmin),
            (Remove, Role::SuperAdmin),
        ],
    )
}
