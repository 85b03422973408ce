//! # Errors
//!
//! Structured errors that travel through the hook pipeline inside
//! `anyhow::Error` and serialize to the JSON body every transport returns:
//!
//! ```json
//! { "name": "NotFound", "message": "...", "code": 404, "className": "not-found" }
//! ```
//!
//! `data` and `errors` are attached only when set.

use anyhow::Error as AnyError;
use serde_json::{json, Value};

pub type ShaktiResult<T> = std::result::Result<T, AnyError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    NotAuthenticated,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    Conflict,
    Unprocessable,
    TooManyRequests,
    GeneralError,
    BadGateway,
    Unavailable,
}

impl ErrorKind {
    const fn meta(self) -> (u16, &'static str, &'static str) {
        match self {
            ErrorKind::BadRequest => (400, "BadRequest", "bad-request"),
            ErrorKind::NotAuthenticated => (401, "NotAuthenticated", "not-authenticated"),
            ErrorKind::Forbidden => (403, "Forbidden", "forbidden"),
            ErrorKind::NotFound => (404, "NotFound", "not-found"),
            ErrorKind::MethodNotAllowed => (405, "MethodNotAllowed", "method-not-allowed"),
            ErrorKind::Conflict => (409, "Conflict", "conflict"),
            ErrorKind::Unprocessable => (422, "Unprocessable", "unprocessable"),
            ErrorKind::TooManyRequests => (429, "TooManyRequests", "too-many-requests"),
            ErrorKind::GeneralError => (500, "GeneralError", "general-error"),
            ErrorKind::BadGateway => (502, "BadGateway", "bad-gateway"),
            ErrorKind::Unavailable => (503, "Unavailable", "unavailable"),
        }
    }

    pub const fn status_code(self) -> u16 {
        self.meta().0
    }

    pub const fn name(self) -> &'static str {
        self.meta().1
    }

    pub const fn class_name(self) -> &'static str {
        self.meta().2
    }
}

/// An error with an HTTP-ish kind, a client-facing message and optional
/// structured payloads.
#[derive(Debug, thiserror::Error)]
#[error("{} ({}): {message}", .kind.name(), .kind.status_code())]
pub struct ShaktiError {
    pub kind: ErrorKind,
    pub message: String,
    pub data: Option<Value>,
    pub errors: Option<Value>,
    #[source]
    pub source: Option<AnyError>,
}

impl ShaktiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
            errors: None,
            source: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_errors(mut self, errors: Value) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Finds a `ShaktiError` anywhere in the chain, so context added with
    /// `anyhow::Context` does not hide the status.
    pub fn from_anyhow(err: &AnyError) -> Option<&ShaktiError> {
        err.chain().find_map(|e| e.downcast_ref::<ShaktiError>())
    }

    /// Keeps a structured error as is and wraps anything else as
    /// `GeneralError`, whose message never carries the inner text.
    pub fn normalize(err: AnyError) -> ShaktiError {
        match err.downcast::<ShaktiError>() {
            Ok(e) => e,
            Err(other) => match Self::from_anyhow(&other) {
                Some(inner) => inner.sanitize_for_client(),
                None => ShaktiError::general_error("Internal server error").with_source(other),
            },
        }
    }

    /// Copy without the source chain.
    pub fn sanitize_for_client(&self) -> ShaktiError {
        ShaktiError {
            kind: self.kind,
            message: self.message.clone(),
            data: self.data.clone(),
            errors: self.errors.clone(),
            source: None,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "name": self.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        });
        if let Some(data) = &self.data {
            body["data"] = data.clone();
        }
        if let Some(errors) = &self.errors {
            body["errors"] = errors.clone();
        }
        body
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn not_authenticated(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAuthenticated, msg)
    }
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn method_not_allowed(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::MethodNotAllowed, msg)
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, msg)
    }
    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unprocessable, msg)
    }
    pub fn too_many_requests(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::TooManyRequests, msg)
    }
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
    pub fn bad_gateway(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadGateway, msg)
    }
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, msg)
    }
}

/// Return early with a `ShaktiError` wrapped in `anyhow::Error`.
///
/// ```ignore
/// bail_shakti!(not_found, "Team not found: {id}");
/// ```
#[macro_export]
macro_rules! bail_shakti {
    ($ctor:ident, $msg:literal) => {
        return Err($crate::errors::ShaktiError::$ctor(format!($msg)).into_anyhow())
    };
    ($ctor:ident, $fmt:literal, $($arg:tt)*) => {
        return Err($crate::errors::ShaktiError::$ctor(format!($fmt, $($arg)*)).into_anyhow())
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn json_shape_omits_empty_payloads() {
        let body = ShaktiError::not_found("Team not found: t1").to_json();
        assert_eq!(
            body,
            json!({"name": "NotFound", "message": "Team not found: t1", "code": 404, "className": "not-found"})
        );
    }

    #[test]
    fn context_does_not_hide_kind() {
        let err = Err::<(), _>(ShaktiError::conflict("taken").into_anyhow())
            .context("creating tenant")
            .unwrap_err();
        let found = ShaktiError::from_anyhow(&err).unwrap();
        assert_eq!(found.code(), 409);
        assert_eq!(ShaktiError::normalize(err).kind, ErrorKind::Conflict);
    }

    #[test]
    fn plain_errors_normalize_to_general_error() {
        let e = ShaktiError::normalize(anyhow::anyhow!("db down"));
        assert_eq!(e.kind, ErrorKind::GeneralError);
        assert_eq!(e.message, "Internal server error");
        assert!(e.source.is_some());
        assert!(e.sanitize_for_client().source.is_none());
    }

    fn bails(id: &str) -> ShaktiResult<()> {
        bail_shakti!(forbidden, "no access to {id}");
    }

    #[test]
    fn bail_macro_formats() {
        let err = bails("c-1").unwrap_err();
        assert_eq!(ShaktiError::from_anyhow(&err).unwrap().message, "no access to c-1");
    }
}
