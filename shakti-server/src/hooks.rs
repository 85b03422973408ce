use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use shakti_core::{AroundHook, ErrorHook, HookContext, Next, ShaktiApp, ShaktiError};

use crate::services::ShaktiParams;

/// One line per service call with its outcome and duration.
pub struct LogAround;

#[async_trait]
impl AroundHook<Value, ShaktiParams> for LogAround {
    async fn run(&self, ctx: &mut HookContext<Value, ShaktiParams>, next: Next<Value, ShaktiParams>) -> Result<()> {
        let started = Instant::now();
        let res = next.run(ctx).await;

        let provider = ctx.params.provider.as_deref().unwrap_or("internal");
        let user = ctx.params.principal.as_ref().map(|p| p.id.as_str()).unwrap_or("-");
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &res {
            Ok(()) => tracing::info!(
                service = %ctx.path,
                method = ctx.method.as_str(),
                tenant = ctx.tenant.label(),
                provider,
                user,
                elapsed_ms,
                "ok"
            ),
            Err(e) => tracing::info!(
                service = %ctx.path,
                method = ctx.method.as_str(),
                tenant = ctx.tenant.label(),
                provider,
                user,
                elapsed_ms,
                status = ShaktiError::from_anyhow(e).map(|se| se.code()).unwrap_or(500),
                "failed"
            ),
        }
        res
    }
}

/// Logs unexpected failures with their source chain before they are
/// sanitized for the client.
pub struct LogUnexpectedErrors;

#[async_trait]
impl ErrorHook<Value, ShaktiParams> for LogUnexpectedErrors {
    async fn run(&self, ctx: &mut HookContext<Value, ShaktiParams>) -> Result<()> {
        let Some(err) = ctx.error.as_ref() else {
            return Ok(());
        };
        let expected = ShaktiError::from_anyhow(err).is_some_and(|e| e.code() < 500);
        if !expected {
            tracing::error!(
                service = %ctx.path,
                method = ctx.method.as_str(),
                tenant = ctx.tenant.label(),
                error = ?err,
                "service call failed"
            );
        }
        Ok(())
    }
}

pub fn global_hooks(app: &ShaktiApp<Value, ShaktiParams>) {
    app.hooks(|h| {
        h.around_all(Arc::new(LogAround));
        h.error_all(Arc::new(LogUnexpectedErrors));
    });
}
