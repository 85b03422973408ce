use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub product_name: String,
    pub column_name: String,
    pub display_name: String,
    #[serde(default = "default_data_type")]
    pub data_type: String,
    #[serde(default = "yes")]
    pub is_active: bool,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default)]
    pub column_order: i64,
}

fn default_data_type() -> String {
    "text".to_string()
}

fn yes() -> bool {
    true
}
