use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use shakti_core::{ServiceCapabilities, ShaktiError, ShaktiService, TenantContext};

use super::columns_schema::{self, ProductRef, SaveColumns};
use super::columns_shared::{self, product_columns, sample_value, CLEAR, EMPID_HEADER, SAVE, TEMPLATE};
use crate::models::ColumnConfig;
use crate::services::{ShaktiParams, ShaktiState};
use crate::store::{Query, Table};
use crate::utils::rows::{from_rows, to_values};
use crate::utils::validator::{require_data, validate, FieldErrors};

pub struct ColumnsService {
    state: Arc<ShaktiState>,
}

impl ColumnsService {
    pub fn new(state: Arc<ShaktiState>) -> Self {
        Self { state }
    }

    /// Replaces every column row of the product with `columns`.
    async fn save(&self, tenant_id: &str, data: Value) -> Result<Value> {
        let input: SaveColumns = validate(&data, columns_schema::ERROR_MESSAGE)?;
        let product = input.product.trim();

        let mut errors = FieldErrors::default();
        let mut seen = HashSet::new();
        for (i, col) in input.columns.iter().enumerate() {
            let name = col.column_name.trim();
            if name.is_empty() {
                errors.push(format!("columns[{i}].column_name"), "column_name is required");
            } else if !seen.insert(name.to_string()) {
                errors.push(format!("columns[{i}].column_name"), format!("Duplicate column name: {name}"));
            }
        }
        if !errors.is_empty() {
            return Err(errors.into_unprocessable(columns_schema::ERROR_MESSAGE));
        }

        let rows: Vec<ColumnConfig> = input
            .columns
            .iter()
            .zip(1..)
            .map(|(col, position)| ColumnConfig {
                id: None,
                tenant_id: tenant_id.to_string(),
                product_name: product.to_string(),
                column_name: col.column_name.trim().to_string(),
                display_name: col.display_name.trim().to_string(),
                data_type: col.data_type.clone().unwrap_or_else(|| "text".to_string()),
                is_active: col.is_active.unwrap_or(true),
                is_custom: col.is_custom.unwrap_or(false),
                column_order: col.column_order.unwrap_or(position),
            })
            .collect();

        let store = self.state.store.as_ref();
        store
            .delete(&Query::tenant(Table::ColumnConfigurations, tenant_id).eq("product_name", product))
            .await?;
        let saved = if rows.is_empty() {
            Vec::new()
        } else {
            store.insert(Table::ColumnConfigurations, to_values(&rows)?).await?
        };

        tracing::info!(tenant = tenant_id, product, columns = saved.len(), "column configuration saved");
        let mut saved: Vec<ColumnConfig> = from_rows(saved)?;
        saved.sort_by_key(|c| c.column_order);
        Ok(json!({"product": product, "columns": saved}))
    }

    async fn clear(&self, tenant_id: &str) -> Result<Value> {
        let removed = self
            .state
            .store
            .delete(&Query::tenant(Table::ColumnConfigurations, tenant_id))
            .await?;
        tracing::info!(tenant = tenant_id, removed, "column configurations cleared");
        Ok(json!({"removed": removed}))
    }

    /// Headers and two sample rows of the upload spreadsheet.
    async fn template(&self, tenant_id: &str, data: Value) -> Result<Value> {
        let input: ProductRef = validate(&data, columns_schema::ERROR_MESSAGE)?;
        let product = input.product.trim();
        let columns = product_columns(self.state.store.as_ref(), tenant_id, product, true).await?;
        if columns.is_empty() {
            return Err(ShaktiError::not_found(format!("No active columns configured for product: {product}")).into_anyhow());
        }

        let headers: Vec<&str> = std::iter::once(EMPID_HEADER)
            .chain(columns.iter().map(|c| c.display_name.as_str()))
            .collect();
        let sample: Vec<Vec<&str>> = [("EMP001", false), ("EMP002", true)]
            .into_iter()
            .map(|(emp_id, second)| {
                std::iter::once(emp_id)
                    .chain(columns.iter().map(|c| sample_value(&c.column_name, second)))
                    .collect()
            })
            .collect();

        Ok(json!({"product": product, "headers": headers, "sample": sample}))
    }
}

#[async_trait]
impl ShaktiService<Value, ShaktiParams> for ColumnsService {
    fn capabilities(&self) -> ServiceCapabilities {
        columns_shared::capabilities()
    }

    async fn find(&self, ctx: &TenantContext, params: ShaktiParams) -> Result<Vec<Value>> {
        let tenant_id = ctx.require_tenant()?.as_str();
        let mut query = Query::tenant(Table::ColumnConfigurations, tenant_id).order_by("column_order", true);
        if let Some(product) = params.query_str("product") {
            query = query.eq("product_name", product);
        }
        if params.query_bool("active") == Some(true) {
            query = query.eq("is_active", true);
        }
        let columns: Vec<ColumnConfig> = from_rows(self.state.store.select(&query).await?)?;
        to_values(&columns)
    }

    async fn custom(
        &self,
        ctx: &TenantContext,
        method: &'static str,
        data: Option<Value>,
        _params: ShaktiParams,
    ) -> Result<Value> {
        let tenant_id = ctx.require_tenant()?.as_str();
        match method {
            SAVE => self.save(tenant_id, require_data(data, method)?).await,
            CLEAR => self.clear(tenant_id).await,
            TEMPLATE => self.template(tenant_id, require_data(data, method)?).await,
            other => Err(ShaktiError::method_not_allowed(format!("Unknown method `{other}`")).into_anyhow()),
        }
    }
}
