use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use crate::models::TenantStatus;

pub const ERROR_MESSAGE: &str = "Tenant validation failed";

fn validate_plan(plan: &str) -> Result<(), validator::ValidationError> {
    match plan {
        "basic" | "standard" | "premium" | "enterprise" => Ok(()),
        _ => Err(validator::ValidationError::new("plan")
            .with_message("plan must be one of: basic, standard, premium, enterprise".into())),
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateTenant {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "subdomain is required"))]
    pub subdomain: String,

    pub domain: Option<String>,

    pub proprietor_name: Option<String>,

    #[validate(length(max = 20, message = "phone_number is too long"))]
    pub phone_number: Option<String>,

    pub address: Option<String>,

    #[validate(length(equal = 15, message = "gst_number must be 15 characters"))]
    pub gst_number: Option<String>,

    #[validate(custom(function = "validate_plan"))]
    pub plan: Option<String>,

    #[validate(range(min = 1, message = "max_users must be at least 1"))]
    pub max_users: Option<i64>,

    #[validate(range(min = 1, message = "max_connections must be at least 1"))]
    pub max_connections: Option<i64>,

    pub settings: Option<Value>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PatchTenant {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,

    pub subdomain: Option<String>,

    pub domain: Option<String>,

    pub status: Option<TenantStatus>,

    pub proprietor_name: Option<String>,

    #[validate(length(max = 20, message = "phone_number is too long"))]
    pub phone_number: Option<String>,

    pub address: Option<String>,

    #[validate(length(equal = 15, message = "gst_number must be 15 characters"))]
    pub gst_number: Option<String>,

    #[validate(custom(function = "validate_plan"))]
    pub plan: Option<String>,

    #[validate(range(min = 1, message = "max_users must be at least 1"))]
    pub max_users: Option<i64>,

    #[validate(range(min = 1, message = "max_connections must be at least 1"))]
    pub max_connections: Option<i64>,

    pub settings: Option<Value>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckSubdomain {
    pub subdomain: String,
}
