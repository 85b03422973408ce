//! Table store.
//!
//! Every record lives in one of a fixed set of tables as a JSON object. The
//! [`Store`] trait is the only way services touch data; it offers the small
//! query surface the application needs (equality and range filters, `ilike`,
//! `in`, null checks, one `order`, `limit`).
//!
//! Two backends implement it: [`MemoryStore`] for development and tests, and
//! [`PostgrestStore`] for a PostgREST endpoint in front of Postgres.

mod memory;
mod postgrest;
pub mod query;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

pub use memory::MemoryStore;
pub use postgrest::PostgrestStore;
pub use query::{Filter, Order, Query};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    SuperAdmins,
    Tenants,
    CompanyAdmins,
    Employees,
    Teams,
    CustomerCases,
    CaseCallLogs,
    ColumnConfigurations,
}

impl Table {
    pub fn as_str(self) -> &'static str {
        match self {
            Table::SuperAdmins => "super_admins",
            Table::Tenants => "tenants",
            Table::CompanyAdmins => "company_admins",
            Table::Employees => "employees",
            Table::Teams => "teams",
            Table::CustomerCases => "customer_cases",
            Table::CaseCallLogs => "case_call_logs",
            Table::ColumnConfigurations => "column_configurations",
        }
    }

    /// Call logs are append-only and carry no `updated_at` column.
    pub fn has_updated_at(self) -> bool {
        !matches!(self, Table::CaseCallLogs)
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts `rows` and returns them as stored, ids and timestamps filled.
    async fn insert(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>>;

    async fn select(&self, query: &Query) -> Result<Vec<Value>>;

    /// Merges `patch` into every matching row and returns the updated rows.
    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>>;

    /// Deletes matching rows and returns how many went.
    async fn delete(&self, query: &Query) -> Result<usize>;

    async fn insert_one(&self, table: Table, row: Value) -> Result<Value> {
        self.insert(table, vec![row])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("insert into {table} returned no row"))
    }

    async fn select_one(&self, query: &Query) -> Result<Option<Value>> {
        let query = query.clone().limit(1);
        Ok(self.select(&query).await?.into_iter().next())
    }

    async fn count(&self, query: &Query) -> Result<usize> {
        Ok(self.select(query).await?.len())
    }
}

/// RFC 3339 UTC timestamp with millisecond precision, the format every
/// `created_at` / `updated_at` column uses. Lexical order is time order.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
