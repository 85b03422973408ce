use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use shakti_core::{BeforeHook, HookContext};
use tracing::info;

use crate::services::ShaktiParams;

/// Logs login attempts by strategy and identifier, never the password.
pub struct LogLoginAttempt;

#[async_trait]
impl BeforeHook<Value, ShaktiParams> for LogLoginAttempt {
    async fn run(&self, ctx: &mut HookContext<Value, ShaktiParams>) -> Result<()> {
        let data = ctx.data.as_ref();
        let field = |k: &str| data.and_then(|d| d.get(k)).and_then(Value::as_str).unwrap_or("");
        info!(
            provider = ctx.params.provider.as_deref().unwrap_or(""),
            tenant = ctx.tenant.label(),
            strategy = field("strategy"),
            identifier = if field("username").is_empty() { field("employee_id") } else { field("username") },
            "authentication.create"
        );
        Ok(())
    }
}
