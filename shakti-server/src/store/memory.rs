use std::cmp::Ordering;
use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use shakti_core::ShaktiError;
use uuid::Uuid;

use super::query::{column_value, compare_values, Query};
use super::{now_timestamp, Store, Table};

/// In-process tables, for development and tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Table, Vec<Map<String, Value>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn matches(query: &Query, row: &Value) -> bool {
        query.filters.iter().all(|f| f.matches(row))
    }
}

fn as_object(table: Table, row: Value) -> Result<Map<String, Value>> {
    match row {
        Value::Object(map) => Ok(map),
        other => Err(ShaktiError::bad_request(format!("{table}: rows must be objects, got {other}")).into_anyhow()),
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>> {
        let now = now_timestamp();
        let mut stamped = Vec::with_capacity(rows.len());
        for row in rows {
            let mut map = as_object(table, row)?;
            let missing = |m: &Map<String, Value>, k: &str| m.get(k).map_or(true, Value::is_null);
            if missing(&map, "id") {
                map.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
            }
            if missing(&map, "created_at") {
                map.insert("created_at".into(), Value::String(now.clone()));
            }
            if table.has_updated_at() && missing(&map, "updated_at") {
                map.insert("updated_at".into(), Value::String(now.clone()));
            }
            stamped.push(map);
        }

        let mut tables = self.tables.write();
        tables.entry(table).or_default().extend(stamped.iter().cloned());
        Ok(stamped.into_iter().map(Value::Object).collect())
    }

    async fn select(&self, query: &Query) -> Result<Vec<Value>> {
        let tables = self.tables.read();
        let mut rows: Vec<Value> = tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .map(|m| Value::Object(m.clone()))
                    .filter(|row| Self::matches(query, row))
                    .collect()
            })
            .unwrap_or_default();
        drop(tables);

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let (x, y) = (column_value(a, &order.column), column_value(b, &order.column));
                let ord = match (x, y) {
                    (Some(x), Some(y)) if !x.is_null() && !y.is_null() => {
                        compare_values(x, y).unwrap_or(Ordering::Equal)
                    }
                    // nulls last either way
                    (Some(x), _) if !x.is_null() => return Ordering::Less,
                    (_, Some(y)) if !y.is_null() => return Ordering::Greater,
                    _ => Ordering::Equal,
                };
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>> {
        let patch = as_object(query.table, patch)?;
        let now = now_timestamp();

        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(&query.table) else {
            return Ok(Vec::new());
        };

        let mut updated = Vec::new();
        for row in rows.iter_mut() {
            if !Self::matches(query, &Value::Object(row.clone())) {
                continue;
            }
            for (k, v) in &patch {
                row.insert(k.clone(), v.clone());
            }
            if query.table.has_updated_at() && !patch.contains_key("updated_at") {
                row.insert("updated_at".into(), Value::String(now.clone()));
            }
            updated.push(Value::Object(row.clone()));
        }
        Ok(updated)
    }

    async fn delete(&self, query: &Query) -> Result<usize> {
        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(&query.table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !Self::matches(query, &Value::Object(row.clone())));
        Ok(before - rows.len())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn insert_stamps_ids_and_timestamps() {
        let store = MemoryStore::new();
        let row = store
            .insert_one(Table::Teams, json!({"tenant_id": "t1", "name": "Alpha"}))
            .await
            .unwrap();
        assert!(row["id"].as_str().is_some());
        assert!(row["created_at"].as_str().is_some());
        assert!(row["updated_at"].as_str().is_some());

        let log = store
            .insert_one(Table::CaseCallLogs, json!({"case_id": "c1"}))
            .await
            .unwrap();
        assert!(log.get("updated_at").is_none());
    }

    #[tokio::test]
    async fn select_filters_orders_and_limits() {
        let store = MemoryStore::new();
        store
            .insert(
                Table::ColumnConfigurations,
                vec![
                    json!({"tenant_id": "t1", "column_name": "b", "column_order": 2}),
                    json!({"tenant_id": "t1", "column_name": "a", "column_order": 1}),
                    json!({"tenant_id": "t2", "column_name": "c", "column_order": 3}),
                ],
            )
            .await
            .unwrap();

        let q = Query::tenant(Table::ColumnConfigurations, "t1").order_by("column_order", true);
        let names: Vec<_> = store
            .select(&q)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r["column_name"].clone())
            .collect();
        assert_eq!(names, vec![json!("a"), json!("b")]);

        let first = store
            .select_one(&Query::new(Table::ColumnConfigurations).order_by("column_order", false))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first["column_name"], "c");
    }

    #[tokio::test]
    async fn update_and_delete_touch_only_matches() {
        let store = MemoryStore::new();
        store
            .insert(
                Table::CustomerCases,
                vec![
                    json!({"tenant_id": "t1", "status": "new"}),
                    json!({"tenant_id": "t1", "status": "closed"}),
                ],
            )
            .await
            .unwrap();

        let q = Query::tenant(Table::CustomerCases, "t1").eq("status", "new");
        let updated = store.update(&q, json!({"status": "assigned"})).await.unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0]["status"], "assigned");

        let gone = store
            .delete(&Query::tenant(Table::CustomerCases, "t1").eq("status", "closed"))
            .await
            .unwrap();
        assert_eq!(gone, 1);
        assert_eq!(store.count(&Query::new(Table::CustomerCases)).await.unwrap(), 1);
    }
}
