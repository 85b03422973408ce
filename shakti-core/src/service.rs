use anyhow::Result;
use async_trait::async_trait;

use crate::errors::ShaktiError;
use crate::tenant::TenantContext;

/// Service methods: the five standard ones plus named custom methods
/// such as `Custom("bulk-assign")`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceMethodKind {
    Find,
    Get,
    Create,
    Patch,
    Remove,
    Custom(&'static str),
}

impl ServiceMethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceMethodKind::Find => "find",
            ServiceMethodKind::Get => "get",
            ServiceMethodKind::Create => "create",
            ServiceMethodKind::Patch => "patch",
            ServiceMethodKind::Remove => "remove",
            ServiceMethodKind::Custom(name) => *name,
        }
    }
}

/// Which methods a service exposes to transports.
///
/// Internal calls through the app are not restricted by capabilities,
/// except that custom methods must be declared to be callable at all.
#[derive(Debug, Clone, Default)]
pub struct ServiceCapabilities {
    pub allowed_methods: Vec<ServiceMethodKind>,
}

impl ServiceCapabilities {
    pub fn standard_crud() -> Self {
        use ServiceMethodKind::*;
        Self {
            allowed_methods: vec![Find, Get, Create, Patch, Remove],
        }
    }

    pub fn from_methods(methods: Vec<ServiceMethodKind>) -> Self {
        Self {
            allowed_methods: methods,
        }
    }

    pub fn with_custom(mut self, names: &[&'static str]) -> Self {
        self.allowed_methods
            .extend(names.iter().map(|n| ServiceMethodKind::Custom(*n)));
        self
    }

    pub fn allows(&self, method: &ServiceMethodKind) -> bool {
        self.allowed_methods.contains(method)
    }

    /// Resolves a method name coming off the wire to its declared custom method.
    pub fn custom(&self, name: &str) -> Option<ServiceMethodKind> {
        self.allowed_methods
            .iter()
            .copied()
            .find(|m| matches!(m, ServiceMethodKind::Custom(n) if *n == name))
    }
}

fn not_implemented(method: &str) -> anyhow::Error {
    ShaktiError::method_not_allowed(format!("Method `{method}` is not supported by this endpoint"))
        .into_anyhow()
}

/// A tenant-aware resource.
///
/// - `find`   → list many, filtered by params
/// - `get`    → one by id
/// - `create` → new record
/// - `patch`  → partial update
/// - `remove` → delete
/// - `custom` → a named operation that is not plain CRUD
///
/// Every method defaults to `MethodNotAllowed`.
#[async_trait]
pub trait ShaktiService<R, P = ()>: Send + Sync
where
    R: Send + 'static,
    P: Send + 'static,
{
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::standard_crud()
    }

    async fn find(&self, _ctx: &TenantContext, _params: P) -> Result<Vec<R>> {
        Err(not_implemented("find"))
    }

    async fn get(&self, _ctx: &TenantContext, _id: &str, _params: P) -> Result<R> {
        Err(not_implemented("get"))
    }

    async fn create(&self, _ctx: &TenantContext, _data: R, _params: P) -> Result<R> {
        Err(not_implemented("create"))
    }

    async fn patch(&self, _ctx: &TenantContext, _id: Option<&str>, _data: R, _params: P) -> Result<R> {
        Err(not_implemented("patch"))
    }

    async fn remove(&self, _ctx: &TenantContext, _id: Option<&str>, _params: P) -> Result<R> {
        Err(not_implemented("remove"))
    }

    async fn custom(
        &self,
        _ctx: &TenantContext,
        method: &'static str,
        _data: Option<R>,
        _params: P,
    ) -> Result<R> {
        Err(not_implemented(method))
    }
}
