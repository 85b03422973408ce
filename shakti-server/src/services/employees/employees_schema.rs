use serde::Deserialize;
use shakti_auth::Role;
use validator::{Validate, ValidationError};

use crate::models::EmployeeStatus;

pub const ERROR_MESSAGE: &str = "Employee validation failed";

fn employee_role(role: &Role) -> Result<(), ValidationError> {
    if role.is_employee_role() {
        Ok(())
    } else {
        Err(ValidationError::new("role").with_message("role must be TeamIncharge or Telecaller".into()))
    }
}

fn mobile_number(mobile: &str) -> Result<(), ValidationError> {
    let digits = mobile.chars().filter(char::is_ascii_digit).count();
    if digits == 10 && mobile.chars().all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '+')) {
        Ok(())
    } else {
        Err(ValidationError::new("mobile").with_message("mobile must be a 10 digit number".into()))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateEmployee {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    #[validate(custom(function = "mobile_number"))]
    pub mobile: Option<String>,

    #[validate(length(min = 1, max = 50, message = "emp_id is required"))]
    pub emp_id: String,

    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,

    #[validate(custom(function = "employee_role"))]
    pub role: Role,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PatchEmployee {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,

    #[validate(custom(function = "mobile_number"))]
    pub mobile: Option<String>,

    #[validate(custom(function = "employee_role"))]
    pub role: Option<Role>,

    pub status: Option<EmployeeStatus>,

    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BulkDelete {
    #[validate(length(min = 1, message = "ids must not be empty"))]
    pub ids: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPassword {
    #[validate(length(min = 1, message = "id is required"))]
    pub id: String,
}
