use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use shakti_core::subdomain::extract_subdomain;
use shakti_core::{ShaktiError, TenantContext, TenantResolver};

use crate::models::{Tenant, TenantStatus};
use crate::store::{Query, Store, Table};
use crate::utils::rows::from_row;

/// Resolves request hosts to tenants stored in the `tenants` table.
pub struct StoreTenantResolver {
    store: Arc<dyn Store>,
}

impl StoreTenantResolver {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>> {
        let row = self
            .store
            .select_one(&Query::new(Table::Tenants).eq("subdomain", subdomain.to_lowercase()))
            .await?;
        row.map(from_row).transpose()
    }
}

#[async_trait]
impl TenantResolver for StoreTenantResolver {
    async fn resolve(&self, identifier: &str) -> Result<TenantContext> {
        let mut tenant = self.by_subdomain(identifier).await?;
        if tenant.is_none() {
            if let Some(sub) = extract_subdomain(identifier).filter(|s| s != identifier) {
                tenant = self.by_subdomain(&sub).await?;
            }
        }

        let Some(tenant) = tenant else {
            return Err(ShaktiError::not_found(format!("Tenant not found for subdomain: {identifier}")).into_anyhow());
        };

        if tenant.status != TenantStatus::Active {
            return Err(ShaktiError::forbidden(format!(
                "Tenant \"{}\" is not active (status: {})",
                tenant.name,
                tenant.status.as_str()
            ))
            .into_anyhow());
        }

        Ok(TenantContext::new(tenant.id).with_subdomain(tenant.subdomain))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::MemoryStore;

    async fn resolver() -> StoreTenantResolver {
        let store = Arc::new(MemoryStore::new());
        store
            .insert(
                Table::Tenants,
                vec![
                    json!({"id": "t-acme", "name": "Acme", "subdomain": "acme", "status": "active"}),
                    json!({"id": "t-old", "name": "Old Co", "subdomain": "oldco", "status": "suspended"}),
                ],
            )
            .await
            .unwrap();
        StoreTenantResolver::new(store)
    }

    fn code(err: &anyhow::Error) -> u16 {
        ShaktiError::from_anyhow(err).unwrap().code()
    }

    #[tokio::test]
    async fn resolves_active_tenants_case_insensitively() {
        let ctx = resolver().await.resolve("ACME").await.unwrap();
        assert_eq!(ctx.tenant_id.unwrap().as_str(), "t-acme");
        assert_eq!(ctx.subdomain.as_deref(), Some("acme"));
    }

    #[tokio::test]
    async fn falls_back_to_the_subdomain_of_a_full_host() {
        let ctx = resolver().await.resolve("acme.shakti.io").await.unwrap();
        assert_eq!(ctx.label(), "t-acme");
    }

    #[tokio::test]
    async fn unknown_and_inactive_tenants_are_rejected() {
        let r = resolver().await;
        let err = r.resolve("nobody").await.unwrap_err();
        assert_eq!(code(&err), 404);
        assert_eq!(err.to_string(), "NotFound (404): Tenant not found for subdomain: nobody");

        let err = r.resolve("oldco").await.unwrap_err();
        assert_eq!(code(&err), 403);
        assert!(err.to_string().contains("Tenant \"Old Co\" is not active (status: suspended)"));
    }
}
