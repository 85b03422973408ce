use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use shakti_axum::axum;
use shakti_core::{
    ServiceCapabilities, ServiceMethodKind, ShaktiApp, ShaktiError, ShaktiService, TenantContext, TenantResolver,
};
use tower::ServiceExt;

struct UnprocessableOnCreate;

#[async_trait::async_trait]
impl ShaktiService<Value, ()> for UnprocessableOnCreate {
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::from_methods(vec![ServiceMethodKind::Create])
    }

    async fn create(&self, _ctx: &TenantContext, _data: Value, _params: ()) -> anyhow::Result<Value> {
        Err(ShaktiError::unprocessable("Invalid")
            .with_errors(json!({"name": ["required"]}))
            .into_anyhow())
    }
}

struct BoomOnCreate;

#[async_trait::async_trait]
impl ShaktiService<Value, ()> for BoomOnCreate {
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::from_methods(vec![ServiceMethodKind::Create])
    }

    async fn create(&self, _ctx: &TenantContext, _data: Value, _params: ()) -> anyhow::Result<Value> {
        Err(anyhow::anyhow!("database password is hunter2"))
    }
}

/// Reports which tenant it ran for.
struct WhoAmI;

#[async_trait::async_trait]
impl ShaktiService<Value, ()> for WhoAmI {
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::from_methods(vec![ServiceMethodKind::Find]).with_custom(&["ping"])
    }

    async fn find(&self, ctx: &TenantContext, _params: ()) -> anyhow::Result<Vec<Value>> {
        Ok(vec![json!({"tenant": ctx.label()})])
    }

    async fn custom(&self, ctx: &TenantContext, method: &'static str, data: Option<Value>, _params: ()) -> anyhow::Result<Value> {
        Ok(json!({"method": method, "tenant": ctx.label(), "data": data}))
    }
}

struct FixedResolver;

#[async_trait::async_trait]
impl TenantResolver for FixedResolver {
    async fn resolve(&self, identifier: &str) -> anyhow::Result<TenantContext> {
        match identifier {
            "acme" => Ok(TenantContext::new("t-acme").with_subdomain("acme")),
            "frozen" => Err(ShaktiError::forbidden("Company account is inactive").into_anyhow()),
            _ => Err(ShaktiError::not_found("Company not found").into_anyhow()),
        }
    }
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn get_on(uri: &str, host: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("host", host)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app: ShaktiApp<Value, ()> = ShaktiApp::new();
    let router = axum(app).use_service("/teams", Arc::new(BoomOnCreate)).into_router();

    let res = router.oneshot(post("/teams", "{\"name\":\"x\"")).await.unwrap();

    assert_eq!(res.status().as_u16(), 400);
    assert!(res.headers().get("x-request-id").is_some());
    let body = json_body(res).await;
    assert_eq!(body["name"], "BadRequest");
    assert_eq!(body["code"], 400);
    assert_eq!(body["className"], "bad-request");
    assert!(body["errors"]["_schema"].is_array());
}

#[tokio::test]
async fn request_id_is_preserved_when_provided() {
    let app: ShaktiApp<Value, ()> = ShaktiApp::new();
    let router = axum(app).use_service("/teams", Arc::new(BoomOnCreate)).into_router();

    let provided = HeaderValue::from_static("req-test-123");
    let mut req = post("/teams", "{\"name\":\"ok\"}");
    req.headers_mut().insert("x-request-id", provided.clone());
    let res = router.oneshot(req).await.unwrap();

    assert_eq!(res.headers().get("x-request-id").unwrap(), &provided);
}

#[tokio::test]
async fn unprocessable_keeps_status_and_field_errors() {
    let app: ShaktiApp<Value, ()> = ShaktiApp::new();
    let router = axum(app)
        .use_service("/teams", Arc::new(UnprocessableOnCreate))
        .into_router();

    let res = router.oneshot(post("/teams", "{\"name\":\"\"}")).await.unwrap();

    assert_eq!(res.status().as_u16(), 422);
    let body = json_body(res).await;
    assert_eq!(body["name"], "Unprocessable");
    assert_eq!(body["className"], "unprocessable");
    assert_eq!(body["errors"], json!({"name": ["required"]}));
}

#[tokio::test]
async fn unexpected_errors_are_sanitized() {
    let app: ShaktiApp<Value, ()> = ShaktiApp::new();
    let router = axum(app).use_service("/teams", Arc::new(BoomOnCreate)).into_router();

    let res = router.oneshot(post("/teams", "{\"name\":\"ok\"}")).await.unwrap();

    assert_eq!(res.status().as_u16(), 500);
    let body = json_body(res).await;
    assert_eq!(body["name"], "GeneralError");
    assert_eq!(body["className"], "general-error");
    assert!(!body.to_string().contains("hunter2"));
}

#[tokio::test]
async fn undeclared_methods_are_not_allowed() {
    let app: ShaktiApp<Value, ()> = ShaktiApp::new();
    let router = axum(app).use_service("/teams", Arc::new(WhoAmI)).into_router();

    let res = router.clone().oneshot(post("/teams", "{}")).await.unwrap();
    assert_eq!(res.status().as_u16(), 405);
    assert_eq!(json_body(res).await["name"], "MethodNotAllowed");

    let res = router.oneshot(post("/teams/explode", "")).await.unwrap();
    assert_eq!(res.status().as_u16(), 405);
}

#[tokio::test]
async fn custom_method_accepts_empty_body() {
    let app: ShaktiApp<Value, ()> = ShaktiApp::new();
    let router = axum(app).use_service("/teams", Arc::new(WhoAmI)).into_router();

    let res = router.oneshot(post("/teams/ping", "")).await.unwrap();

    assert_eq!(res.status().as_u16(), 200);
    let body = json_body(res).await;
    assert_eq!(body["method"], "ping");
    assert_eq!(body["data"], Value::Null);
}

#[tokio::test]
async fn tenant_is_resolved_from_host() {
    let app: ShaktiApp<Value, ()> = ShaktiApp::new();
    let router = axum(app)
        .use_service("/teams", Arc::new(WhoAmI))
        .with_tenant_resolver(Arc::new(FixedResolver))
        .into_router();

    let res = router.clone().oneshot(get_on("/teams", "acme.shakti.io")).await.unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(json_body(res).await, json!([{"tenant": "t-acme"}]));

    let res = router.clone().oneshot(get_on("/teams", "shakti.io")).await.unwrap();
    assert_eq!(json_body(res).await, json!([{"tenant": "platform"}]));

    let res = router.clone().oneshot(get_on("/teams", "nobody.shakti.io")).await.unwrap();
    assert_eq!(res.status().as_u16(), 404);

    let res = router.oneshot(get_on("/teams", "frozen.shakti.io")).await.unwrap();
    assert_eq!(res.status().as_u16(), 403);
    assert_eq!(json_body(res).await["message"], "Company account is inactive");
}
