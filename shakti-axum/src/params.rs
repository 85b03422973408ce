use std::collections::HashMap;

use axum::http::{HeaderMap, Uri};

/// Transport details of a REST call, handed to the service params type.
#[derive(Debug, Clone, Default)]
pub struct RestParams {
    pub provider: String,
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub method: String,
    pub path: String,
}

impl RestParams {
    pub fn from_parts(headers: &HeaderMap, query: HashMap<String, String>, method: &str, uri: &Uri) -> Self {
        let headers = headers
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.as_str().to_string(), s.to_string())))
            .collect();

        Self {
            provider: "rest".to_string(),
            headers,
            query,
            method: method.to_string(),
            path: uri.path().to_string(),
        }
    }

    pub fn query_str(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(|s| s.trim()).filter(|s| !s.is_empty())
    }

    pub fn query_bool(&self, key: &str) -> Option<bool> {
        self.query_str(key).map(|v| matches!(v, "true" | "1" | "yes"))
    }
}

pub trait FromRestParams: Sized {
    fn from_rest_params(params: RestParams) -> Self;
}

impl FromRestParams for RestParams {
    fn from_rest_params(params: RestParams) -> Self {
        params
    }
}

impl FromRestParams for () {
    fn from_rest_params(_params: RestParams) -> Self {}
}
