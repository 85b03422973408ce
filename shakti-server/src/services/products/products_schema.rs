use serde::Deserialize;
use validator::Validate;

pub const ERROR_MESSAGE: &str = "Product validation failed";

#[derive(Debug, Deserialize, Validate)]
pub struct ProductName {
    #[validate(length(min = 1, max = 100, message = "Product name is required"))]
    pub name: String,
}
