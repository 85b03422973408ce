use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use validator::{Validate, ValidationError};

pub const ERROR_MESSAGE: &str = "Call log validation failed";

fn calendar_date(raw: &str) -> Result<(), ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| ValidationError::new("date").with_message("ptp_date must be a YYYY-MM-DD date".into()))
}

fn amount(value: &Value) -> Result<(), ValidationError> {
    let ok = match value {
        Value::Null => true,
        Value::Number(n) => n.as_f64().is_some_and(|n| n >= 0.0),
        Value::String(s) => s.trim().is_empty() || s.trim().replace(',', "").parse::<f64>().is_ok_and(|n| n >= 0.0),
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(ValidationError::new("amount").with_message("amount_collected must be a non-negative amount".into()))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateCallLog {
    #[validate(length(min = 1, message = "case_id is required"))]
    pub case_id: String,

    #[validate(length(min = 1, message = "call_status is required"))]
    pub call_status: String,

    #[validate(custom(function = "calendar_date"))]
    pub ptp_date: Option<String>,

    pub call_notes: Option<String>,

    #[validate(range(min = 0, message = "call_duration must not be negative"))]
    pub call_duration: Option<i64>,

    pub call_result: Option<String>,

    #[validate(custom(function = "amount"))]
    pub amount_collected: Option<Value>,
}
