//! Multi-tenant request context.
//!
//! Every service call carries a [`TenantContext`]. A request on the main
//! domain runs in the platform context (no tenant), which is where
//! SuperAdmins work. A request on `<subdomain>.<domain>` runs in the context
//! of the tenant that owns that subdomain.

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ShaktiError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub String);

impl TenantId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        TenantId(s.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantContext {
    pub tenant_id: Option<TenantId>,
    pub subdomain: Option<String>,
}

impl TenantContext {
    pub fn platform() -> Self {
        Self::default()
    }

    pub fn new<S: Into<String>>(tenant: S) -> Self {
        Self {
            tenant_id: Some(TenantId(tenant.into())),
            subdomain: None,
        }
    }

    pub fn with_subdomain(mut self, subdomain: impl Into<String>) -> Self {
        self.subdomain = Some(subdomain.into());
        self
    }

    pub fn is_platform(&self) -> bool {
        self.tenant_id.is_none()
    }

    /// The tenant id, or `BadRequest` when the call came in on the main domain.
    pub fn require_tenant(&self) -> Result<&TenantId> {
        self.tenant_id
            .as_ref()
            .ok_or_else(|| ShaktiError::bad_request("No tenant subdomain detected in URL").into_anyhow())
    }

    /// Label used in logs.
    pub fn label(&self) -> &str {
        self.tenant_id.as_ref().map(|t| t.as_str()).unwrap_or("platform")
    }
}

/// Maps a host-derived identifier (usually a subdomain) to a tenant.
///
/// Implementations return `NotFound` for unknown identifiers and
/// `Forbidden` for tenants that exist but may not be used.
#[async_trait]
pub trait TenantResolver: Send + Sync {
    async fn resolve(&self, identifier: &str) -> Result<TenantContext>;
}
