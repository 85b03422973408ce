//! Turns uploaded spreadsheet rows into case data.
//!
//! Rows arrive as header → cell maps. Headers are matched to column
//! configurations by display name (or column name), ignoring case; the
//! `EMPID` header names the telecaller a row is meant for.

use std::collections::HashMap;

use anyhow::Result;
use serde_json::{Map, Value};
use shakti_core::ShaktiError;

use super::cases_schema::UPLOAD_ERROR_MESSAGE;
use crate::models::ColumnConfig;
use crate::services::columns::columns_shared::EMPID_HEADER;
use crate::utils::rows::cell_text;
use crate::utils::validator::FieldErrors;

const REQUIRED_COLUMNS: [&str; 2] = ["customerName", "loanId"];

/// One accepted row: its position in the upload, the employee ID it names
/// and its cells keyed by column name.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseRow {
    pub index: usize,
    pub emp_id: String,
    pub case_data: Map<String, Value>,
}

fn normalize(header: &str) -> String {
    header.trim().to_lowercase()
}

/// Header (lower-cased) → column name. Display names win over column names.
fn header_lookup(columns: &[ColumnConfig]) -> HashMap<String, &str> {
    let mut lookup = HashMap::new();
    for c in columns {
        lookup.insert(normalize(&c.column_name), c.column_name.as_str());
    }
    for c in columns {
        lookup.insert(normalize(&c.display_name), c.column_name.as_str());
    }
    lookup
}

fn display_name<'a>(columns: &'a [ColumnConfig], column: &'a str) -> &'a str {
    columns
        .iter()
        .find(|c| c.column_name == column)
        .map(|c| c.display_name.as_str())
        .unwrap_or(column)
}

fn row_errors(row: &Map<String, Value>, columns: &[ColumnConfig]) -> Vec<String> {
    let text = |key: &str| row.get(key).map(cell_text).unwrap_or_default();
    let mut errors = Vec::new();

    if text(EMPID_HEADER).is_empty() {
        errors.push("EMPID is required".to_string());
    }
    for column in REQUIRED_COLUMNS {
        if text(column).is_empty() {
            errors.push(format!("{} is required", display_name(columns, column)));
        }
    }

    let mobile = text("mobileNo");
    if !mobile.is_empty() && mobile.chars().filter(char::is_ascii_digit).count() != 10 {
        errors.push("Invalid mobile number format".to_string());
    }
    let dpd = text("dpd");
    if !dpd.is_empty() && dpd.parse::<f64>().is_err() {
        errors.push("DPD must be a number".to_string());
    }

    errors
}

/// Maps and validates every row. Blank rows are dropped; a single invalid
/// row fails the whole upload with per-row messages.
pub fn parse_rows(rows: &[Map<String, Value>], columns: &[ColumnConfig]) -> Result<Vec<CaseRow>> {
    let has_empid = rows
        .iter()
        .any(|r| r.keys().any(|k| normalize(k) == normalize(EMPID_HEADER)));
    if !has_empid {
        return Err(ShaktiError::unprocessable("EMPID column not found in the upload")
            .with_errors(serde_json::json!({"rows": ["EMPID column not found in the upload"]}))
            .into_anyhow());
    }

    let lookup = header_lookup(columns);
    let mut accepted = Vec::new();
    let mut errors = FieldErrors::default();

    for (index, raw) in rows.iter().enumerate() {
        if raw.values().all(|v| cell_text(v).is_empty()) {
            continue;
        }

        let mut mapped = Map::new();
        for (header, value) in raw {
            let key = normalize(header);
            if key == normalize(EMPID_HEADER) {
                mapped.insert(EMPID_HEADER.to_string(), Value::String(cell_text(value)));
            } else if let Some(column) = lookup.get(&key) {
                mapped.insert((*column).to_string(), Value::String(cell_text(value)));
            }
        }

        let problems = row_errors(&mapped, columns);
        if problems.is_empty() {
            let emp_id = mapped.get(EMPID_HEADER).map(cell_text).unwrap_or_default();
            accepted.push(CaseRow {
                index,
                emp_id,
                case_data: mapped,
            });
        } else {
            for p in problems {
                errors.push(format!("rows[{index}]"), p);
            }
        }
    }

    if !errors.is_empty() {
        return Err(errors.into_unprocessable(UPLOAD_ERROR_MESSAGE));
    }
    if accepted.is_empty() {
        return Err(ShaktiError::unprocessable("No data rows found in the upload").into_anyhow());
    }
    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::services::columns::columns_shared::default_columns;

    fn rows(v: Value) -> Vec<Map<String, Value>> {
        serde_json::from_value(v).unwrap()
    }

    fn errors_of(err: anyhow::Error) -> Value {
        ShaktiError::from_anyhow(&err).unwrap().to_json()["errors"].clone()
    }

    #[test]
    fn headers_map_by_display_name_ignoring_case() {
        let columns = default_columns("t1", "Personal Loan");
        let parsed = parse_rows(
            &rows(json!([
                {"empid": " EMP001 ", "CUSTOMER NAME": "Rajesh Kumar", "Loan ID": "LN1", "Mobile No": "98765-43210", "DPD": 45, "Unknown": "x"},
                {"EMPID": "", "Customer Name": "", "Loan ID": ""}
            ])),
            &columns,
        )
        .unwrap();

        assert_eq!(parsed.len(), 1);
        let row = &parsed[0];
        assert_eq!(row.emp_id, "EMP001");
        assert_eq!(row.case_data["customerName"], "Rajesh Kumar");
        assert_eq!(row.case_data["dpd"], "45");
        assert_eq!(row.case_data["mobileNo"], "98765-43210");
        assert!(!row.case_data.contains_key("Unknown"));
    }

    #[test]
    fn one_bad_row_rejects_the_upload() {
        let columns = default_columns("t1", "Personal Loan");
        let err = parse_rows(
            &rows(json!([
                {"EMPID": "E1", "Customer Name": "A", "Loan ID": "L1"},
                {"EMPID": "E2", "Customer Name": "", "Loan ID": "L2", "Mobile No": "123", "DPD": "many"}
            ])),
            &columns,
        )
        .unwrap_err();

        let errors = errors_of(err);
        assert_eq!(
            errors["rows[1]"],
            json!(["Customer Name is required", "Invalid mobile number format", "DPD must be a number"])
        );
        assert!(errors.get("rows[0]").is_none());
    }

    #[test]
    fn empid_header_and_data_are_required() {
        let columns = default_columns("t1", "Personal Loan");
        let missing = parse_rows(&rows(json!([{"Customer Name": "A"}])), &columns).unwrap_err();
        assert_eq!(ShaktiError::from_anyhow(&missing).unwrap().code(), 422);

        let blank = parse_rows(&rows(json!([{"EMPID": " "}])), &columns).unwrap_err();
        assert_eq!(
            ShaktiError::from_anyhow(&blank).unwrap().message,
            "No data rows found in the upload"
        );
    }
}
