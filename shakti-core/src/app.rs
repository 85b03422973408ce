use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;

use crate::errors::ShaktiError;
use crate::hooks::{
    collect_method_hooks, AfterHook, AroundHook, BeforeHook, ErrorHook, HookContext, HookResult,
    Next, ServiceHooks,
};
use crate::{AppConfig, ConfigSnapshot, ServiceMethodKind, ServiceRegistry, ShaktiService, TenantContext};

struct AppInner<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    registry: RwLock<ServiceRegistry<R, P>>,
    global_hooks: RwLock<ServiceHooks<R, P>>,
    service_hooks: RwLock<HashMap<String, ServiceHooks<R, P>>>,
    config: RwLock<AppConfig>,
}

/// Application container: service registry, app and per-service hooks,
/// and key/value config. Cloning is cheap and shares everything.
pub struct ShaktiApp<R, P = ()>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    inner: Arc<AppInner<R, P>>,
}

type HooksForMethod<R, P> = (
    Vec<Arc<dyn AroundHook<R, P>>>,
    Vec<Arc<dyn BeforeHook<R, P>>>,
    Vec<Arc<dyn AfterHook<R, P>>>,
    Vec<Arc<dyn ErrorHook<R, P>>>,
);

impl<R, P> Default for ShaktiApp<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R, P> Clone for ShaktiApp<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, P> ShaktiApp<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(AppInner {
                registry: RwLock::new(ServiceRegistry::new()),
                global_hooks: RwLock::new(ServiceHooks::new()),
                service_hooks: RwLock::new(HashMap::new()),
                config: RwLock::new(AppConfig::new()),
            }),
        }
    }

    pub fn register_service<S>(&self, name: S, service: Arc<dyn ShaktiService<R, P>>)
    where
        S: Into<String>,
    {
        self.inner.registry.write().register(name, service);
    }

    pub fn service_names(&self) -> Vec<String> {
        self.inner.registry.read().names()
    }

    /// App-level hooks, run for every service ahead of its own hooks.
    pub fn hooks<F>(&self, f: F)
    where
        F: FnOnce(&mut ServiceHooks<R, P>),
    {
        let mut hooks = self.inner.global_hooks.write();
        f(&mut hooks);
    }

    pub(crate) fn configure_service_hooks<F>(&self, service_name: &str, f: F)
    where
        F: FnOnce(&mut ServiceHooks<R, P>),
    {
        let mut map = self.inner.service_hooks.write();
        f(map.entry(service_name.to_string()).or_default());
    }

    pub fn service(&self, name: &str) -> Result<ServiceHandle<R, P>> {
        let service = self
            .inner
            .registry
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ShaktiError::not_found(format!("Service not found: {name}")).into_anyhow())?;

        Ok(ServiceHandle {
            app: self.clone(),
            name: name.to_string(),
            service,
        })
    }

    pub fn set<K, V>(&self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.inner.config.write().set(key, value);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.config.read().get(key).map(str::to_string)
    }

    pub fn load_env(&self, prefix: &str) -> usize {
        self.inner.config.write().load_env(prefix)
    }

    pub fn config_snapshot(&self) -> ConfigSnapshot {
        self.inner.config.read().snapshot()
    }
}

/// One pending call, carried into the innermost pipeline stage.
#[derive(Debug, Clone)]
enum Invocation {
    Find,
    Get(String),
    Create,
    Patch(Option<String>),
    Remove(Option<String>),
    Custom(&'static str),
}

impl Invocation {
    fn kind(&self) -> ServiceMethodKind {
        match self {
            Invocation::Find => ServiceMethodKind::Find,
            Invocation::Get(_) => ServiceMethodKind::Get,
            Invocation::Create => ServiceMethodKind::Create,
            Invocation::Patch(_) => ServiceMethodKind::Patch,
            Invocation::Remove(_) => ServiceMethodKind::Remove,
            Invocation::Custom(name) => ServiceMethodKind::Custom(*name),
        }
    }
}

fn missing_data(method: &str) -> anyhow::Error {
    ShaktiError::bad_request(format!("`{method}` requires a request body")).into_anyhow()
}

async fn dispatch<R, P>(
    service: &dyn ShaktiService<R, P>,
    call: &Invocation,
    ctx: &mut HookContext<R, P>,
) -> Result<()>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    let result = match call {
        Invocation::Find => HookResult::Many(service.find(&ctx.tenant, ctx.params.clone()).await?),
        Invocation::Get(id) => HookResult::One(service.get(&ctx.tenant, id, ctx.params.clone()).await?),
        Invocation::Create => {
            let data = ctx.data.take().ok_or_else(|| missing_data("create"))?;
            HookResult::One(service.create(&ctx.tenant, data, ctx.params.clone()).await?)
        }
        Invocation::Patch(id) => {
            let data = ctx.data.take().ok_or_else(|| missing_data("patch"))?;
            HookResult::One(
                service
                    .patch(&ctx.tenant, id.as_deref(), data, ctx.params.clone())
                    .await?,
            )
        }
        Invocation::Remove(id) => HookResult::One(
            service
                .remove(&ctx.tenant, id.as_deref(), ctx.params.clone())
                .await?,
        ),
        Invocation::Custom(name) => {
            let data = ctx.data.take();
            HookResult::One(service.custom(&ctx.tenant, *name, data, ctx.params.clone()).await?)
        }
    };
    ctx.result = Some(result);
    Ok(())
}

/// A registered service bound to its app, so calls run through the hooks.
pub struct ServiceHandle<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    app: ShaktiApp<R, P>,
    name: String,
    service: Arc<dyn ShaktiService<R, P>>,
}

impl<R, P> ServiceHandle<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    pub fn hooks<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut ServiceHooks<R, P>),
    {
        self.app.configure_service_hooks(&self.name, f);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inner(&self) -> &Arc<dyn ShaktiService<R, P>> {
        &self.service
    }

    pub fn capabilities(&self) -> crate::ServiceCapabilities {
        self.service.capabilities()
    }

    fn collect_hooks(&self, method: &ServiceMethodKind) -> HooksForMethod<R, P> {
        let g = self.app.inner.global_hooks.read();
        let map = self.app.inner.service_hooks.read();

        let mut around = collect_method_hooks(&g.around_all, &g.around_by_method, method);
        let mut before = collect_method_hooks(&g.before_all, &g.before_by_method, method);
        let mut after = collect_method_hooks(&g.after_all, &g.after_by_method, method);
        let mut error = collect_method_hooks(&g.error_all, &g.error_by_method, method);

        if let Some(h) = map.get(&self.name) {
            around.extend(collect_method_hooks(&h.around_all, &h.around_by_method, method));
            before.extend(collect_method_hooks(&h.before_all, &h.before_by_method, method));
            after.extend(collect_method_hooks(&h.after_all, &h.after_by_method, method));
            error.extend(collect_method_hooks(&h.error_all, &h.error_by_method, method));
        }

        (around, before, after, error)
    }

    fn context(&self, tenant: TenantContext, method: ServiceMethodKind, params: P) -> HookContext<R, P> {
        HookContext::new(
            tenant,
            self.name.clone(),
            method,
            params,
            ServiceCaller::new(self.app.clone()),
            self.app.config_snapshot(),
        )
    }

    async fn run_pipeline(&self, call: Invocation, mut ctx: HookContext<R, P>) -> Result<HookContext<R, P>> {
        let (around, before, after, error) = self.collect_hooks(&call.kind());
        let service = Arc::clone(&self.service);

        let mut next: Next<R, P> = Next::new(move |ctx| {
            Box::pin(async move {
                for h in &before {
                    h.run(ctx).await?;
                }
                dispatch(service.as_ref(), &call, ctx).await?;
                for h in &after {
                    h.run(ctx).await?;
                }
                Ok(())
            })
        });

        // first registered around hook ends up outermost
        for hook in around.into_iter().rev() {
            let inner = next;
            next = Next::new(move |ctx| Box::pin(async move { hook.run(ctx, inner).await }));
        }

        if let Err(e) = next.run(&mut ctx).await {
            ctx.error = Some(e);
            for h in &error {
                if let Err(hook_err) = h.run(&mut ctx).await {
                    tracing::warn!(service = %self.name, error = %hook_err, "error hook failed");
                }
            }
            if let Some(err) = ctx.error.take() {
                return Err(err);
            }
        }

        Ok(ctx)
    }

    fn one(&self, ctx: HookContext<R, P>, method: &str) -> Result<R> {
        match ctx.result {
            Some(HookResult::One(v)) => Ok(v),
            Some(HookResult::Many(_)) => Err(anyhow::anyhow!("{}.{method} produced many results", self.name)),
            None => Err(anyhow::anyhow!("{}.{method} produced no result", self.name)),
        }
    }

    pub async fn find(&self, tenant: TenantContext, params: P) -> Result<Vec<R>> {
        let ctx = self.context(tenant, ServiceMethodKind::Find, params);
        let ctx = self.run_pipeline(Invocation::Find, ctx).await?;
        match ctx.result {
            Some(HookResult::Many(v)) => Ok(v),
            Some(HookResult::One(v)) => Ok(vec![v]),
            None => Ok(Vec::new()),
        }
    }

    pub async fn get(&self, tenant: TenantContext, id: &str, params: P) -> Result<R> {
        let ctx = self.context(tenant, ServiceMethodKind::Get, params);
        let ctx = self.run_pipeline(Invocation::Get(id.to_string()), ctx).await?;
        self.one(ctx, "get")
    }

    pub async fn create(&self, tenant: TenantContext, data: R, params: P) -> Result<R> {
        let mut ctx = self.context(tenant, ServiceMethodKind::Create, params);
        ctx.data = Some(data);
        let ctx = self.run_pipeline(Invocation::Create, ctx).await?;
        self.one(ctx, "create")
    }

    pub async fn patch(&self, tenant: TenantContext, id: Option<&str>, data: R, params: P) -> Result<R> {
        let mut ctx = self.context(tenant, ServiceMethodKind::Patch, params);
        ctx.data = Some(data);
        let ctx = self
            .run_pipeline(Invocation::Patch(id.map(str::to_string)), ctx)
            .await?;
        self.one(ctx, "patch")
    }

    pub async fn remove(&self, tenant: TenantContext, id: Option<&str>, params: P) -> Result<R> {
        let ctx = self.context(tenant, ServiceMethodKind::Remove, params);
        let ctx = self
            .run_pipeline(Invocation::Remove(id.map(str::to_string)), ctx)
            .await?;
        self.one(ctx, "remove")
    }

    /// Calls a custom method by name. Unknown names are `MethodNotAllowed`.
    pub async fn custom(&self, tenant: TenantContext, method: &str, data: Option<R>, params: P) -> Result<R> {
        let Some(ServiceMethodKind::Custom(name)) = self.service.capabilities().custom(method) else {
            return Err(ShaktiError::method_not_allowed(format!(
                "Method `{method}` is not available on `{}`",
                self.name
            ))
            .into_anyhow());
        };
        let mut ctx = self.context(tenant, ServiceMethodKind::Custom(name), params);
        ctx.data = data;
        let ctx = self.run_pipeline(Invocation::Custom(name), ctx).await?;
        self.one(ctx, method)
    }
}

/// Handle given to hooks for calling other services of the same app.
pub struct ServiceCaller<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    app: ShaktiApp<R, P>,
}

impl<R, P> Clone for ServiceCaller<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            app: self.app.clone(),
        }
    }
}

impl<R, P> ServiceCaller<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    pub fn new(app: ShaktiApp<R, P>) -> Self {
        Self { app }
    }

    pub fn service(&self, name: &str) -> Result<ServiceHandle<R, P>> {
        self.app.service(name)
    }
}
