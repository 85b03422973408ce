use std::sync::Arc;

use serde_json::Value;
use shakti_auth::Authenticate;
use shakti_core::{ServiceCapabilities, ServiceMethodKind, ShaktiApp};

use crate::services::{ShaktiParams, ShaktiState};

pub fn capabilities() -> ServiceCapabilities {
    ServiceCapabilities::from_methods(vec![ServiceMethodKind::Create, ServiceMethodKind::Get])
}

pub fn register_hooks(app: &ShaktiApp<Value, ShaktiParams>, state: &ShaktiState) -> anyhow::Result<()> {
    let tokens = Arc::clone(&state.tokens);
    app.service("authentication")?.hooks(|h| {
        h.before_create(Arc::new(super::authentication_hooks::LogLoginAttempt));
        h.before(ServiceMethodKind::Get, Arc::new(Authenticate::new(tokens)));
    });
    Ok(())
}
