use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::Value;
use shakti_core::ShaktiError;

use super::query::{Filter, Query};
use super::{now_timestamp, Store, Table};

/// Tables behind a PostgREST endpoint (`{base}/{table}`).
///
/// Ids and `created_at` come from column defaults in the database; this
/// client only sets `updated_at` on updates.
#[derive(Clone)]
pub struct PostgrestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PostgrestStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn request(&self, method: Method, table: Table) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.base_url, table.as_str()))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(&self, table: Table, req: RequestBuilder) -> Result<Vec<Value>> {
        let res = req.send().await.map_err(|e| {
            ShaktiError::unavailable("Data store is unreachable")
                .with_source(e.into())
                .into_anyhow()
        })?;

        let status = res.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        let body: Value = res.json().await.map_err(|e| {
            ShaktiError::bad_gateway(format!("Unreadable response from data store for {table}"))
                .with_source(e.into())
                .into_anyhow()
        })?;

        if !status.is_success() {
            return Err(store_error(table, status, &body).into_anyhow());
        }

        match body {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Ok(vec![other]),
        }
    }
}

/// Maps a PostgREST error body (`{code, message, details, hint}`).
fn store_error(table: Table, status: StatusCode, body: &Value) -> ShaktiError {
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("request failed")
        .to_string();
    let code = body.get("code").and_then(Value::as_str).unwrap_or_default();

    tracing::warn!(%table, status = status.as_u16(), code, %message, "data store rejected request");

    match (status, code) {
        // unique_violation
        (_, "23505") | (StatusCode::CONFLICT, _) => ShaktiError::conflict(message),
        // foreign_key_violation, not_null_violation, check_violation
        (_, "23503" | "23502" | "23514") => ShaktiError::bad_request(message),
        (StatusCode::NOT_FOUND, _) => ShaktiError::bad_gateway(format!("Data store has no table {table}")),
        _ => ShaktiError::bad_gateway(format!("Data store error on {table}: {message}")),
    }
}

fn literal(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Quotes a value for use inside `in.(...)` / `or=(...)` lists.
fn quoted(v: &Value) -> String {
    quote_text(literal(v))
}

fn quote_text(s: String) -> String {
    if s.contains([',', '(', ')', '"', ' ', '.']) {
        format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        s
    }
}

/// `op.value` as used in both `col=op.value` and `or=(col.op.value)`.
/// Values inside an `or` list are quoted.
fn operator(filter: &Filter, in_list: bool) -> Option<(&str, String)> {
    let value = |v: &Value| if in_list { quoted(v) } else { literal(v) };
    Some(match filter {
        Filter::Eq(c, v) => (c.as_str(), format!("eq.{}", value(v))),
        Filter::Neq(c, v) => (c.as_str(), format!("neq.{}", value(v))),
        Filter::IsNull(c) => (c.as_str(), "is.null".to_string()),
        Filter::NotNull(c) => (c.as_str(), "not.is.null".to_string()),
        Filter::In(c, vs) => (
            c.as_str(),
            format!("in.({})", vs.iter().map(quoted).collect::<Vec<_>>().join(",")),
        ),
        Filter::Gte(c, v) => (c.as_str(), format!("gte.{}", value(v))),
        Filter::Lte(c, v) => (c.as_str(), format!("lte.{}", value(v))),
        Filter::ILike(c, p) => {
            let pattern = p.replace('%', "*");
            let pattern = if in_list { quote_text(pattern) } else { pattern };
            (c.as_str(), format!("ilike.{pattern}"))
        }
        Filter::Or(_) => return None,
    })
}

/// Query-string pairs for the filters, order and limit of `query`.
pub(crate) fn query_pairs(query: &Query) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for filter in &query.filters {
        match filter {
            Filter::Or(inner) => {
                let parts: Vec<String> = inner
                    .iter()
                    .filter_map(|f| operator(f, true))
                    .map(|(c, op)| format!("{c}.{op}"))
                    .collect();
                pairs.push(("or".to_string(), format!("({})", parts.join(","))));
            }
            f => {
                if let Some((c, op)) = operator(f, false) {
                    pairs.push((c.to_string(), op));
                }
            }
        }
    }
    if let Some(order) = &query.order {
        let dir = if order.ascending { "asc" } else { "desc" };
        pairs.push(("order".to_string(), format!("{}.{dir}.nullslast", order.column)));
    }
    if let Some(limit) = query.limit {
        pairs.push(("limit".to_string(), limit.to_string()));
    }
    pairs
}

#[async_trait]
impl Store for PostgrestStore {
    async fn insert(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let req = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&rows);
        self.send(table, req).await
    }

    async fn select(&self, query: &Query) -> Result<Vec<Value>> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        pairs.extend(query_pairs(query));
        let req = self.request(Method::GET, query.table).query(&pairs);
        self.send(query.table, req).await
    }

    async fn update(&self, query: &Query, mut patch: Value) -> Result<Vec<Value>> {
        if query.table.has_updated_at() {
            if let Some(map) = patch.as_object_mut() {
                map.entry("updated_at")
                    .or_insert_with(|| Value::String(now_timestamp()));
            }
        }
        let req = self
            .request(Method::PATCH, query.table)
            .query(&query_pairs(query))
            .header("Prefer", "return=representation")
            .json(&patch);
        self.send(query.table, req).await
    }

    async fn delete(&self, query: &Query) -> Result<usize> {
        let req = self
            .request(Method::DELETE, query.table)
            .query(&query_pairs(query))
            .header("Prefer", "return=representation");
        Ok(self.send(query.table, req).await?.len())
    }
}
