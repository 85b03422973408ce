use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use shakti_core::{ServiceCapabilities, ShaktiError, ShaktiService, TenantContext};

use super::products_schema::{self, ProductName};
use super::products_shared::{self, product_exists, product_names};
use crate::services::columns::columns_shared::default_columns;
use crate::services::{ShaktiParams, ShaktiState};
use crate::store::{Query, Table};
use crate::utils::rows::{not_found, to_values};
use crate::utils::validator::validate;

/// A product is the set of column rows sharing a `product_name`; it has no
/// table of its own.
pub struct ProductsService {
    state: Arc<ShaktiState>,
}

impl ProductsService {
    pub fn new(state: Arc<ShaktiState>) -> Self {
        Self { state }
    }

    fn name_of(data: &Value) -> Result<String> {
        let input: ProductName = validate(data, products_schema::ERROR_MESSAGE)?;
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ShaktiError::unprocessable(products_schema::ERROR_MESSAGE)
                .with_errors(json!({"name": ["Product name is required"]}))
                .into_anyhow());
        }
        Ok(name)
    }

    async fn existing(&self, tenant_id: &str, id: Option<&str>) -> Result<String> {
        let name = id
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ShaktiError::bad_request("Product name is required").into_anyhow())?;
        if !product_exists(self.state.store.as_ref(), tenant_id, name).await? {
            return Err(not_found("Product", name));
        }
        Ok(name.to_string())
    }
}

#[async_trait]
impl ShaktiService<Value, ShaktiParams> for ProductsService {
    fn capabilities(&self) -> ServiceCapabilities {
        products_shared::capabilities()
    }

    async fn find(&self, ctx: &TenantContext, _params: ShaktiParams) -> Result<Vec<Value>> {
        let tenant_id = ctx.require_tenant()?.as_str();
        let names = product_names(self.state.store.as_ref(), tenant_id).await?;
        Ok(names.into_iter().map(Value::String).collect())
    }

    async fn create(&self, ctx: &TenantContext, data: Value, _params: ShaktiParams) -> Result<Value> {
        let tenant_id = ctx.require_tenant()?.as_str();
        let name = Self::name_of(&data)?;
        let store = self.state.store.as_ref();

        if product_exists(store, tenant_id, &name).await? {
            return Err(ShaktiError::conflict("Product already exists").into_anyhow());
        }

        let columns = store
            .insert(Table::ColumnConfigurations, to_values(&default_columns(tenant_id, &name))?)
            .await?;
        tracing::info!(tenant = tenant_id, product = %name, columns = columns.len(), "product created");
        Ok(json!({"name": name, "columns": columns.len()}))
    }

    /// Renames the product everywhere it is referenced.
    async fn patch(&self, ctx: &TenantContext, id: Option<&str>, data: Value, _params: ShaktiParams) -> Result<Value> {
        let tenant_id = ctx.require_tenant()?.as_str();
        let current = self.existing(tenant_id, id).await?;
        let renamed = Self::name_of(&data)?;
        if renamed == current {
            return Ok(json!({"name": renamed}));
        }

        let store = self.state.store.as_ref();
        if product_exists(store, tenant_id, &renamed).await? {
            return Err(ShaktiError::conflict("Product already exists").into_anyhow());
        }

        for table in [Table::ColumnConfigurations, Table::Teams, Table::CustomerCases] {
            store
                .update(
                    &Query::tenant(table, tenant_id).eq("product_name", current.as_str()),
                    json!({"product_name": renamed}),
                )
                .await?;
        }
        tracing::info!(tenant = tenant_id, from = %current, to = %renamed, "product renamed");
        Ok(json!({"name": renamed, "previous": current}))
    }

    async fn remove(&self, ctx: &TenantContext, id: Option<&str>, _params: ShaktiParams) -> Result<Value> {
        let tenant_id = ctx.require_tenant()?.as_str();
        let name = self.existing(tenant_id, id).await?;
        let removed = self
            .state
            .store
            .delete(&Query::tenant(Table::ColumnConfigurations, tenant_id).eq("product_name", name.as_str()))
            .await?;
        tracing::info!(tenant = tenant_id, product = %name, removed, "product removed");
        Ok(json!({"name": name, "removedColumns": removed}))
    }
}
