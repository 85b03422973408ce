use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shakti_core::ShaktiError;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Field path → messages, serialized as the `errors` of a 422.
#[derive(Debug, Default)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_unprocessable(self, message: &str) -> anyhow::Error {
        ShaktiError::unprocessable(message)
            .with_errors(json!(self.0))
            .into_anyhow()
    }
}

fn friendly_message(code: &str) -> Option<&'static str> {
    match code {
        "required" => Some("is required"),
        "email" => Some("must be a valid email"),
        "length" => Some("has invalid length"),
        "range" => Some("is out of range"),
        "url" => Some("must be a valid URL"),
        _ => None,
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

fn collect(out: &mut FieldErrors, prefix: &str, errs: &ValidationErrors) {
    for (field, kind) in errs.errors() {
        let key = join_path(prefix, field);
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for e in field_errors {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .or_else(|| friendly_message(&e.code).map(str::to_string))
                        .unwrap_or_else(|| e.code.to_string());
                    out.push(key.clone(), msg);
                }
            }
            ValidationErrorsKind::Struct(nested) => collect(out, &key, nested),
            ValidationErrorsKind::List(items) => {
                for (idx, nested) in items {
                    collect(out, &format!("{key}[{idx}]"), nested);
                }
            }
        }
    }
}

/// Parses `data` into `T` and runs its `validator` rules. Both failures are
/// `Unprocessable` with per-field messages.
pub fn validate<T>(data: &Value, error_message: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned + Validate,
{
    let parsed: T = serde_json::from_value(data.clone()).map_err(|e| {
        ShaktiError::unprocessable(error_message)
            .with_errors(json!({"_schema": [e.to_string()]}))
            .into_anyhow()
    })?;

    parsed.validate().map_err(|e| {
        let mut out = FieldErrors::default();
        collect(&mut out, "", &e);
        out.into_unprocessable(error_message)
    })?;

    Ok(parsed)
}

/// Rejects empty payloads of custom methods that need one.
pub fn require_data(data: Option<Value>, method: &str) -> anyhow::Result<Value> {
    data.ok_or_else(|| ShaktiError::bad_request(format!("`{method}` requires a request body")).into_anyhow())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    struct Member {
        #[validate(length(min = 1, message = "must not be empty"))]
        emp_id: String,
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Team {
        #[validate(length(min = 1, message = "name is required"))]
        name: String,
        #[validate(nested)]
        members: Vec<Member>,
    }

    #[test]
    fn nested_errors_are_flattened_with_paths() {
        let data = json!({"name": "", "members": [{"emp_id": "E1"}, {"emp_id": ""}]});
        let err = validate::<Team>(&data, "Team validation failed").unwrap_err();
        let e = ShaktiError::from_anyhow(&err).unwrap();

        assert_eq!(e.code(), 422);
        let body = e.to_json();
        assert_eq!(body["message"], "Team validation failed");
        assert_eq!(body["errors"]["name"], json!(["name is required"]));
        assert_eq!(body["errors"]["members[1].emp_id"], json!(["must not be empty"]));
    }

    #[test]
    fn shape_errors_land_under_schema() {
        let err = validate::<Team>(&json!({"name": 5}), "Team validation failed").unwrap_err();
        let body = ShaktiError::from_anyhow(&err).unwrap().to_json();
        assert!(body["errors"]["_schema"].is_array());
    }
}
