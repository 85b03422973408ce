use std::collections::HashMap;
use std::sync::Arc;

use shakti_auth::{AuthParams, Principal, TokenService};
use shakti_axum::{FromRestParams, RestParams};
use shakti_core::ShaktiError;

use crate::config::Settings;
use crate::store::Store;

/// Per-call params: transport details plus the authenticated principal.
#[derive(Debug, Clone, Default)]
pub struct ShaktiParams {
    /// `Some("rest")` for HTTP calls, `None` for calls made inside the app.
    pub provider: Option<String>,
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub method: String,
    pub path: String,
    pub principal: Option<Principal>,
}

impl ShaktiParams {
    /// Params for a call made by the application itself.
    pub fn internal() -> Self {
        Self::default()
    }

    /// Internal call on behalf of `principal`.
    pub fn internal_as(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
            ..Self::default()
        }
    }

    pub fn query_str(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(|s| s.trim()).filter(|s| !s.is_empty())
    }

    pub fn query_bool(&self, key: &str) -> Option<bool> {
        self.query_str(key).map(|v| matches!(v, "true" | "1" | "yes"))
    }

    pub fn require_principal(&self) -> anyhow::Result<&Principal> {
        self.principal
            .as_ref()
            .ok_or_else(|| ShaktiError::not_authenticated("Not authenticated").into_anyhow())
    }
}

impl FromRestParams for ShaktiParams {
    fn from_rest_params(p: RestParams) -> Self {
        Self {
            provider: Some(p.provider),
            headers: p.headers,
            query: p.query,
            method: p.method,
            path: p.path,
            principal: None,
        }
    }
}

impl AuthParams for ShaktiParams {
    fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    fn set_principal(&mut self, principal: Principal) {
        self.principal = Some(principal);
    }
}

/// What every service shares.
pub struct ShaktiState {
    pub store: Arc<dyn Store>,
    pub tokens: Arc<TokenService>,
    pub settings: Arc<Settings>,
}
