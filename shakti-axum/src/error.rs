use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shakti_core::ShaktiError;

/// Adapter error: any `anyhow::Error`, rendered as the JSON error body.
#[derive(Debug)]
pub struct AxumError(pub anyhow::Error);

impl From<anyhow::Error> for AxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<ShaktiError> for AxumError {
    fn from(e: ShaktiError) -> Self {
        Self(e.into_anyhow())
    }
}

impl IntoResponse for AxumError {
    fn into_response(self) -> Response {
        let err = ShaktiError::normalize(self.0);
        if err.code() >= 500 {
            tracing::error!(error = ?err, "request failed");
        }
        let safe = err.sanitize_for_client();
        let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(safe.to_json())).into_response()
    }
}
