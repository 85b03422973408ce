//! Per-request tenant resolution.
//!
//! The middleware derives a tenant identifier from the request host and
//! stores the resolved [`TenantContext`] in the request extensions, where the
//! REST handlers pick it up. Requests on the main domain get the platform
//! context.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use shakti_core::subdomain::tenant_identifier;
use shakti_core::{TenantContext, TenantResolver};

use crate::AxumError;

/// Explicit tenant override, for local development and API clients that
/// cannot control the Host header.
pub const TENANT_SUBDOMAIN_HEADER: &str = "x-tenant-subdomain";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Host as the client saw it: `X-Forwarded-Host` (first entry), then `Host`.
pub fn request_host(headers: &HeaderMap) -> Option<String> {
    header_str(headers, "x-forwarded-host")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .or_else(|| header_str(headers, header::HOST.as_str()))
        .map(str::to_string)
}

/// The identifier to resolve, or `None` for the main domain.
pub fn tenant_identifier_for(headers: &HeaderMap) -> Option<String> {
    if let Some(explicit) = header_str(headers, TENANT_SUBDOMAIN_HEADER) {
        return Some(explicit.to_ascii_lowercase());
    }
    request_host(headers).and_then(|host| tenant_identifier(&host))
}

pub async fn resolve_tenant(
    State(resolver): State<Arc<dyn TenantResolver>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AxumError> {
    let tenant = match tenant_identifier_for(req.headers()) {
        Some(identifier) => {
            let ctx = resolver.resolve(&identifier).await?;
            tracing::debug!(%identifier, tenant = ctx.label(), "resolved tenant");
            ctx
        }
        None => TenantContext::platform(),
    };

    req.extensions_mut().insert(tenant);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for (k, v) in pairs {
            h.insert(*k, v.parse().unwrap());
        }
        h
    }

    #[test]
    fn forwarded_host_wins_over_host() {
        let h = headers(&[("host", "internal:8080"), ("x-forwarded-host", "acme.shakti.io, proxy")]);
        assert_eq!(request_host(&h).as_deref(), Some("acme.shakti.io"));
        assert_eq!(tenant_identifier_for(&h).as_deref(), Some("acme"));
    }

    #[test]
    fn main_domain_has_no_identifier() {
        assert_eq!(tenant_identifier_for(&headers(&[("host", "www.shakti.io")])), None);
        assert_eq!(tenant_identifier_for(&headers(&[("host", "localhost:3030")])), None);
    }

    #[test]
    fn explicit_header_overrides_host() {
        let h = headers(&[("host", "localhost:3030"), ("x-tenant-subdomain", "Acme")]);
        assert_eq!(tenant_identifier_for(&h).as_deref(), Some("acme"));
    }
}
