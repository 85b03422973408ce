use serde::Deserialize;
use validator::Validate;

pub const ERROR_MESSAGE: &str = "Column configuration validation failed";

#[derive(Debug, Deserialize, Validate)]
pub struct ColumnInput {
    #[validate(length(min = 1, message = "column_name is required"))]
    pub column_name: String,

    #[validate(length(min = 1, message = "display_name is required"))]
    pub display_name: String,

    pub data_type: Option<String>,

    pub is_active: Option<bool>,

    pub is_custom: Option<bool>,

    #[validate(range(min = 1, message = "column_order starts at 1"))]
    pub column_order: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SaveColumns {
    #[validate(length(min = 1, message = "product is required"))]
    pub product: String,

    #[validate(nested)]
    pub columns: Vec<ColumnInput>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProductRef {
    #[validate(length(min = 1, message = "product is required"))]
    pub product: String,
}
