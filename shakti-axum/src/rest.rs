//! REST mapping of one service:
//!
//! | route            | method |
//! |------------------|--------|
//! | `GET /`          | find   |
//! | `POST /`         | create |
//! | `GET /{id}`      | get    |
//! | `PATCH /{id}`    | patch  |
//! | `DELETE /{id}`   | remove |
//! | `POST /{method}` | custom |

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::HeaderMap;
use axum::{routing, Extension, Json, Router};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use shakti_core::{ServiceHandle, ServiceMethodKind, ShaktiApp, ShaktiError, TenantContext};

use crate::params::{FromRestParams, RestParams};
use crate::AxumError;

pub struct RestState<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    app: Arc<ShaktiApp<R, P>>,
    service: Arc<str>,
}

impl<R, P> Clone for RestState<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            app: Arc::clone(&self.app),
            service: Arc::clone(&self.service),
        }
    }
}

impl<R, P> RestState<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    /// The service, if it exposes `method` to transports.
    fn exposed(&self, method: ServiceMethodKind) -> Result<ServiceHandle<R, P>, AxumError> {
        let svc = self.app.service(&self.service)?;
        if !svc.capabilities().allows(&method) {
            return Err(ShaktiError::method_not_allowed(format!(
                "Method `{}` is not allowed on `{}`",
                method.as_str(),
                self.service
            ))
            .into());
        }
        Ok(svc)
    }
}

type RestQuery = Query<HashMap<String, String>>;

fn tenant(ext: Option<Extension<TenantContext>>) -> TenantContext {
    ext.map(|Extension(t)| t).unwrap_or_default()
}

fn params<P: FromRestParams>(headers: &HeaderMap, query: HashMap<String, String>, method: &str, uri: &axum::http::Uri) -> P {
    P::from_rest_params(RestParams::from_parts(headers, query, method, uri))
}

fn map_json_rejection(rejection: JsonRejection) -> AxumError {
    ShaktiError::bad_request("Failed to parse the request body as JSON")
        .with_errors(json!({"_schema": [rejection.body_text()]}))
        .into()
}

async fn find<R, P>(
    State(state): State<RestState<R, P>>,
    ext: Option<Extension<TenantContext>>,
    headers: HeaderMap,
    Query(query): RestQuery,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<Vec<R>>, AxumError>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let svc = state.exposed(ServiceMethodKind::Find)?;
    let res = svc.find(tenant(ext), params(&headers, query, "GET", &uri)).await?;
    Ok(Json(res))
}

async fn get<R, P>(
    State(state): State<RestState<R, P>>,
    ext: Option<Extension<TenantContext>>,
    headers: HeaderMap,
    Query(query): RestQuery,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
) -> Result<Json<R>, AxumError>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let svc = state.exposed(ServiceMethodKind::Get)?;
    let res = svc.get(tenant(ext), &id, params(&headers, query, "GET", &uri)).await?;
    Ok(Json(res))
}

async fn create<R, P>(
    State(state): State<RestState<R, P>>,
    ext: Option<Extension<TenantContext>>,
    headers: HeaderMap,
    Query(query): RestQuery,
    OriginalUri(uri): OriginalUri,
    data: Result<Json<R>, JsonRejection>,
) -> Result<Json<R>, AxumError>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let Json(data) = data.map_err(map_json_rejection)?;
    let svc = state.exposed(ServiceMethodKind::Create)?;
    let res = svc.create(tenant(ext), data, params(&headers, query, "POST", &uri)).await?;
    Ok(Json(res))
}

async fn patch<R, P>(
    State(state): State<RestState<R, P>>,
    ext: Option<Extension<TenantContext>>,
    headers: HeaderMap,
    Query(query): RestQuery,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
    data: Result<Json<R>, JsonRejection>,
) -> Result<Json<R>, AxumError>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let Json(data) = data.map_err(map_json_rejection)?;
    let svc = state.exposed(ServiceMethodKind::Patch)?;
    let res = svc
        .patch(tenant(ext), Some(&id), data, params(&headers, query, "PATCH", &uri))
        .await?;
    Ok(Json(res))
}

async fn remove<R, P>(
    State(state): State<RestState<R, P>>,
    ext: Option<Extension<TenantContext>>,
    headers: HeaderMap,
    Query(query): RestQuery,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
) -> Result<Json<R>, AxumError>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let svc = state.exposed(ServiceMethodKind::Remove)?;
    let res = svc
        .remove(tenant(ext), Some(&id), params(&headers, query, "DELETE", &uri))
        .await?;
    Ok(Json(res))
}

/// `POST /{method}`; an empty body calls the method without data.
async fn custom<R, P>(
    State(state): State<RestState<R, P>>,
    ext: Option<Extension<TenantContext>>,
    headers: HeaderMap,
    Query(query): RestQuery,
    OriginalUri(uri): OriginalUri,
    Path(method): Path<String>,
    body: Bytes,
) -> Result<Json<R>, AxumError>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let data = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        Some(serde_json::from_slice::<R>(&body).map_err(|e| {
            AxumError::from(
                ShaktiError::bad_request("Failed to parse the request body as JSON")
                    .with_errors(json!({"_schema": [e.to_string()]})),
            )
        })?)
    };

    let svc = state.app.service(&state.service)?;
    let res = svc
        .custom(tenant(ext), &method, data, params(&headers, query, "POST", &uri))
        .await?;
    Ok(Json(res))
}

pub fn service_router<R, P>(service: Arc<str>, app: Arc<ShaktiApp<R, P>>) -> Router<()>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let state = RestState { app, service };

    Router::new()
        .route("/", routing::get(find::<R, P>).post(create::<R, P>))
        .route(
            "/{id}",
            routing::get(get::<R, P>)
                .patch(patch::<R, P>)
                .delete(remove::<R, P>)
                .post(custom::<R, P>),
        )
        .with_state(state)
}
