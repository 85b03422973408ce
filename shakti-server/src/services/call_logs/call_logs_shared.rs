use serde_json::Value;
use shakti_auth::Role;
use shakti_core::{ServiceCapabilities, ServiceMethodKind, ShaktiApp};

use crate::services::{gate, ShaktiParams, ShaktiState};

pub fn capabilities() -> ServiceCapabilities {
    ServiceCapabilities::from_methods(vec![ServiceMethodKind::Find, ServiceMethodKind::Create])
}

pub fn register_hooks(app: &ShaktiApp<Value, ShaktiParams>, state: &ShaktiState) -> anyhow::Result<()> {
    use ServiceMethodKind::*;
    gate(
        app,
        state,
        "call-logs",
        &[(Find, Role::Telecaller), (Create, Role::Telecaller)],
    )
}
