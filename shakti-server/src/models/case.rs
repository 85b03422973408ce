use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::rows::cell_text;

/// Lifecycle of a case. `new` cases have no telecaller; every other status
/// is reached through assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    New,
    Assigned,
    InProgress,
    Resolved,
    Closed,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 5] = [
        CaseStatus::New,
        CaseStatus::Assigned,
        CaseStatus::InProgress,
        CaseStatus::Resolved,
        CaseStatus::Closed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CaseStatus::New => "new",
            CaseStatus::Assigned => "assigned",
            CaseStatus::InProgress => "in_progress",
            CaseStatus::Resolved => "resolved",
            CaseStatus::Closed => "closed",
        }
    }

    /// Still being worked: neither resolved nor closed.
    pub fn is_open(self) -> bool {
        !matches!(self, CaseStatus::Resolved | CaseStatus::Closed)
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CaseStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| format!("unknown case status `{s}`"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerCase {
    pub id: String,
    pub tenant_id: String,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub telecaller_id: Option<String>,
    #[serde(default)]
    pub case_data: Map<String, Value>,
    pub status: CaseStatus,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub uploaded_by: Option<String>,
    #[serde(default)]
    pub assigned_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl CustomerCase {
    pub fn field(&self, column: &str) -> Option<String> {
        self.case_data
            .get(column)
            .map(cell_text)
            .filter(|s| !s.is_empty())
    }

    pub fn dpd(&self) -> Option<i64> {
        self.field("dpd")?.parse::<f64>().ok().map(|d| d as i64)
    }

    pub fn outstanding_amount(&self) -> Option<f64> {
        parse_amount(&self.field("outstandingAmount")?)
    }
}

/// Amounts arrive as spreadsheet text, sometimes with separators.
pub fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim().replace([',', ' '], "").parse().ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn statuses_round_trip_through_text() {
        assert_eq!("in_progress".parse::<CaseStatus>(), Ok(CaseStatus::InProgress));
        assert!("pending".parse::<CaseStatus>().is_err());
        assert_eq!(json!(CaseStatus::InProgress), json!("in_progress"));
    }

    #[test]
    fn numeric_fields_tolerate_spreadsheet_text() {
        let case: CustomerCase = serde_json::from_value(json!({
            "id": "c1",
            "tenant_id": "t1",
            "status": "new",
            "case_data": {"dpd": "45", "outstandingAmount": "4,50,000"}
        }))
        .unwrap();
        assert_eq!(case.dpd(), Some(45));
        assert_eq!(case.outstanding_amount(), Some(450000.0));
        assert_eq!(case.field("loanId"), None);
    }
}
