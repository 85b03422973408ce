use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallLog {
    pub id: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    pub case_id: String,
    pub employee_id: String,
    pub call_status: String,
    #[serde(default)]
    pub ptp_date: Option<String>,
    #[serde(default)]
    pub call_notes: Option<String>,
    #[serde(default)]
    pub call_duration: Option<i64>,
    #[serde(default)]
    pub call_result: Option<String>,
    /// Text or number, as entered.
    #[serde(default)]
    pub amount_collected: Option<Value>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl CallLog {
    pub fn amount(&self) -> f64 {
        match &self.amount_collected {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.trim().replace(',', "").parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }
}
