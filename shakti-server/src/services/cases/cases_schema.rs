use serde::Deserialize;
use serde_json::{Map, Value};
use validator::Validate;

use crate::models::CaseStatus;

pub const ERROR_MESSAGE: &str = "Case validation failed";
pub const UPLOAD_ERROR_MESSAGE: &str = "Upload validation failed";

#[derive(Debug, Deserialize, Validate)]
pub struct PatchCase {
    pub status: Option<CaseStatus>,

    #[validate(length(max = 20, message = "priority is too long"))]
    pub priority: Option<String>,

    pub remarks: Option<String>,

    /// Cell edits merged into `case_data`. Not open to telecallers.
    pub case_data: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UploadCases {
    #[validate(length(min = 1, message = "team_id is required"))]
    pub team_id: String,

    #[validate(length(min = 1, message = "product_name is required"))]
    pub product_name: String,

    /// Header → cell maps, one per spreadsheet row.
    #[serde(default)]
    pub rows: Vec<Map<String, Value>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignCases {
    #[validate(length(min = 1, message = "Select at least one case"))]
    pub case_ids: Vec<String>,

    #[validate(length(min = 1, message = "telecaller_id is required"))]
    pub telecaller_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UnassignCases {
    #[validate(length(min = 1, message = "Select at least one case"))]
    pub case_ids: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReassignCases {
    #[validate(length(min = 1, message = "from_telecaller is required"))]
    pub from_telecaller: String,

    #[validate(length(min = 1, message = "to_telecaller is required"))]
    pub to_telecaller: String,

    pub product: Option<String>,

    pub dpd_range: Option<String>,

    #[validate(range(min = 0.0, message = "min_amount must not be negative"))]
    pub min_amount: Option<f64>,

    #[validate(range(min = 0.0, message = "max_amount must not be negative"))]
    pub max_amount: Option<f64>,

    #[serde(default)]
    pub preview: bool,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CaseStats {
    pub telecaller_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ExportCases {
    #[validate(length(min = 1, message = "product is required"))]
    pub product: String,

    pub team_id: Option<String>,
}
