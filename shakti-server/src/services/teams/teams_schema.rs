use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::models::TeamStatus;

pub const ERROR_MESSAGE: &str = "Team validation failed";

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank"))
    } else {
        Ok(())
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateTeam {
    #[validate(custom(function = "not_blank", message = "Team name is required"))]
    pub name: String,

    #[validate(custom(function = "not_blank", message = "Team incharge is required"))]
    pub team_incharge_id: String,

    #[validate(custom(function = "not_blank", message = "Product name is required"))]
    pub product_name: String,

    #[serde(default)]
    pub telecaller_ids: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PatchTeam {
    #[validate(custom(function = "not_blank", message = "Team name must not be empty"))]
    pub name: Option<String>,

    #[validate(custom(function = "not_blank", message = "Team incharge must not be empty"))]
    pub team_incharge_id: Option<String>,

    #[validate(custom(function = "not_blank", message = "Product name must not be empty"))]
    pub product_name: Option<String>,

    pub status: Option<TeamStatus>,

    pub telecaller_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TeamRef {
    #[validate(length(min = 1, message = "id is required"))]
    pub id: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct AvailableTelecallers {
    pub exclude_team_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct TeamTelecallers {
    pub team_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use shakti_core::ShaktiError;

    use super::*;
    use crate::utils::validator::validate;

    #[test]
    fn whitespace_names_are_blank() {
        let data = json!({"name": "   ", "team_incharge_id": "i1", "product_name": "Gold"});
        let err = validate::<CreateTeam>(&data, ERROR_MESSAGE).unwrap_err();
        let body = ShaktiError::from_anyhow(&err).unwrap().to_json();
        assert_eq!(body["errors"]["name"], json!(["Team name is required"]));

        let patch = validate::<PatchTeam>(&json!({"product_name": "\t"}), ERROR_MESSAGE).unwrap_err();
        assert_eq!(ShaktiError::from_anyhow(&patch).unwrap().code(), 422);
    }
}
