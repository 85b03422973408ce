use serde::Deserialize;
use validator::Validate;

pub const ERROR_MESSAGE: &str = "Company admin validation failed";

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateCompanyAdmin {
    /// Taken from the request host when absent.
    pub tenant_id: Option<String>,

    #[validate(length(min = 1, max = 50, message = "employee_id is required"))]
    pub employee_id: String,

    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    #[validate(email(message = "email must be a valid email"))]
    pub email: Option<String>,

    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}
