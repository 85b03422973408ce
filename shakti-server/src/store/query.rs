use std::cmp::Ordering;

use serde_json::Value;

use super::Table;

/// A row predicate. Columns may address a key inside a JSON column with
/// `column->>key`, e.g. `case_data->>loanId`.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Neq(String, Value),
    IsNull(String),
    NotNull(String),
    In(String, Vec<Value>),
    Gte(String, Value),
    Lte(String, Value),
    /// Case-insensitive match; `%` matches any run of characters.
    ILike(String, String),
    /// Any of the inner filters.
    Or(Vec<Filter>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: Table,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Eq(column.to_string(), value.into()))
    }

    pub fn neq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Neq(column.to_string(), value.into()))
    }

    pub fn is_null(self, column: &str) -> Self {
        self.filter(Filter::IsNull(column.to_string()))
    }

    pub fn not_null(self, column: &str) -> Self {
        self.filter(Filter::NotNull(column.to_string()))
    }

    pub fn is_in<V: Into<Value>>(self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.filter(Filter::In(
            column.to_string(),
            values.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Gte(column.to_string(), value.into()))
    }

    pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Lte(column.to_string(), value.into()))
    }

    pub fn ilike(self, column: &str, pattern: impl Into<String>) -> Self {
        self.filter(Filter::ILike(column.to_string(), pattern.into()))
    }

    pub fn or(self, filters: Vec<Filter>) -> Self {
        self.filter(Filter::Or(filters))
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn newest_first(self) -> Self {
        self.order_by("created_at", false)
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// The tenant scope nearly every query starts from.
    pub fn tenant(table: Table, tenant_id: &str) -> Self {
        Self::new(table).eq("tenant_id", tenant_id)
    }
}

/// Resolves `column` or `column->>key` against a row.
pub fn column_value<'a>(row: &'a Value, column: &str) -> Option<&'a Value> {
    let mut parts = column.split("->>").flat_map(|p| p.split("->"));
    let first = parts.next()?;
    let mut current = row.get(first.trim())?;
    for key in parts {
        current = current.get(key.trim())?;
    }
    Some(current)
}

/// Orders scalars the way a SQL column would: numbers numerically,
/// everything else by its text. Numeric text compares as a number.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    fn as_number(v: &Value) -> Option<f64> {
        match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    match (a, b) {
        (Value::String(x), Value::String(y)) => match (x.trim().parse::<f64>(), y.trim().parse::<f64>()) {
            (Ok(x), Ok(y)) => x.partial_cmp(&y),
            _ => Some(x.cmp(y)),
        },
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => as_number(a)?.partial_cmp(&as_number(b)?),
    }
}

/// Text against text is exact; `"45"` equals `45`.
fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(_), Value::String(_)) => a == b,
        _ => a == b || (!a.is_null() && !b.is_null() && compare_values(a, b) == Some(Ordering::Equal)),
    }
}

/// Matches `text` against an `ilike` pattern.
pub fn ilike_matches(text: &str, pattern: &str) -> bool {
    let text = text.to_lowercase();
    let pattern = pattern.to_lowercase();
    let parts: Vec<&str> = pattern.split('%').collect();

    if parts.len() == 1 {
        return text == pattern;
    }

    let mut rest = text.as_str();
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            let Some(stripped) = rest.strip_prefix(part) else {
                return false;
            };
            rest = stripped;
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            let Some(pos) = rest.find(part) else {
                return false;
            };
            rest = &rest[pos + part.len()..];
        }
    }
    true
}

impl Filter {
    pub fn matches(&self, row: &Value) -> bool {
        let null = Value::Null;
        let get = |c: &str| column_value(row, c).unwrap_or(&null);

        match self {
            Filter::Eq(c, v) => loosely_equal(get(c), v),
            Filter::Neq(c, v) => !get(c).is_null() && !loosely_equal(get(c), v),
            Filter::IsNull(c) => get(c).is_null(),
            Filter::NotNull(c) => !get(c).is_null(),
            Filter::In(c, vs) => vs.iter().any(|v| loosely_equal(get(c), v)),
            Filter::Gte(c, v) => matches!(compare_values(get(c), v), Some(Ordering::Greater | Ordering::Equal)),
            Filter::Lte(c, v) => matches!(compare_values(get(c), v), Some(Ordering::Less | Ordering::Equal)),
            Filter::ILike(c, p) => match get(c) {
                Value::String(s) => ilike_matches(s, p),
                Value::Number(n) => ilike_matches(&n.to_string(), p),
                _ => false,
            },
            Filter::Or(fs) => fs.iter().any(|f| f.matches(row)),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn json_paths_reach_into_case_data() {
        let row = json!({"case_data": {"loanId": "LN1"}});
        assert_eq!(column_value(&row, "case_data->>loanId"), Some(&json!("LN1")));
        assert_eq!(column_value(&row, "case_data->>missing"), None);
    }

    #[test]
    fn ilike_wildcards() {
        assert!(ilike_matches("Rajesh Kumar", "%kumar%"));
        assert!(ilike_matches("Rajesh Kumar", "raj%"));
        assert!(ilike_matches("Rajesh Kumar", "%mar"));
        assert!(!ilike_matches("Rajesh Kumar", "kumar%"));
        assert!(ilike_matches("abc", "ABC"));
    }

    #[test]
    fn numeric_text_compares_as_numbers() {
        assert_eq!(compare_values(&json!("45"), &json!("9")), Some(Ordering::Greater));
        assert_eq!(compare_values(&json!("45"), &json!(45)), Some(Ordering::Equal));
        assert_eq!(
            compare_values(&json!("2024-01-02T00:00:00.000Z"), &json!("2024-01-01T23:59:59.999Z")),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn filters_on_rows() {
        let row = json!({"status": "new", "telecaller_id": null, "dpd": "61"});
        assert!(Filter::IsNull("telecaller_id".into()).matches(&row));
        assert!(Filter::In("status".into(), vec![json!("new"), json!("assigned")]).matches(&row));
        assert!(Filter::Gte("dpd".into(), json!(61)).matches(&row));
        assert!(!Filter::Neq("telecaller_id".into(), json!("x")).matches(&row));
        assert!(Filter::Or(vec![
            Filter::Eq("status".into(), json!("closed")),
            Filter::Eq("status".into(), json!("new")),
        ])
        .matches(&row));
    }
}
