use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use shakti_auth::{JwtOptions, LocalStrategyOptions};
use shakti_core::ShaktiApp;

use crate::services::ShaktiParams;

const DEV_JWT_SECRET: &str = "shakti-dev-secret-change-me";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgrest { url: String, api_key: String },
}

#[derive(Debug, Clone)]
pub struct SuperAdminSeed {
    pub username: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub environment: String,
    pub http_host: String,
    pub http_port: u16,
    pub jwt: JwtOptions,
    pub bcrypt_cost: u32,
    pub store: StoreBackend,
    pub base_domain: Option<String>,
    pub super_admin: Option<SuperAdminSeed>,
    pub max_upload_rows: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            http_host: "127.0.0.1".to_string(),
            http_port: 3030,
            jwt: JwtOptions {
                secret: DEV_JWT_SECRET.to_string(),
                ..JwtOptions::default()
            },
            bcrypt_cost: 10,
            store: StoreBackend::Memory,
            base_domain: None,
            super_admin: None,
            max_upload_rows: 1000,
        }
    }
}

#[derive(Deserialize)]
struct HumanDuration(#[serde(with = "humantime_serde")] Duration);

fn parse_duration(raw: &str) -> Result<Duration> {
    serde_json::from_value::<HumanDuration>(Value::String(raw.to_string()))
        .map(|d| d.0)
        .map_err(|e| anyhow!("invalid duration `{raw}`: {e}"))
}

impl Settings {
    /// Reads the process environment (after `.env`, when present).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut s = Settings::default();

        if let Some(env) = var("APP_ENV") {
            s.environment = env;
        }
        if let Some(host) = var("HTTP_HOST") {
            s.http_host = host;
        }
        if let Some(port) = var("HTTP_PORT") {
            s.http_port = port.parse().with_context(|| format!("HTTP_PORT `{port}` is not a port"))?;
        }

        match var("AUTH_JWT_SECRET") {
            Some(secret) => s.jwt.secret = secret,
            None if s.is_production() => return Err(anyhow!("AUTH_JWT_SECRET is required in production")),
            None => tracing::warn!("AUTH_JWT_SECRET not set, using the development secret"),
        }
        if let Some(issuer) = var("AUTH_JWT_ISSUER") {
            s.jwt.issuer = issuer;
        }
        if let Some(audience) = var("AUTH_JWT_AUDIENCE") {
            s.jwt.audience = audience;
        }
        if let Some(ttl) = var("AUTH_JWT_EXPIRES_IN") {
            s.jwt.access_token_expires_in = parse_duration(&ttl)?;
        }
        s.jwt.validate()?;

        if let Some(cost) = var("AUTH_BCRYPT_COST") {
            s.bcrypt_cost = cost.parse().with_context(|| format!("AUTH_BCRYPT_COST `{cost}` is not a number"))?;
        }

        s.store = match var("STORE_BACKEND").as_deref() {
            None | Some("memory") => StoreBackend::Memory,
            Some("postgrest") => StoreBackend::Postgrest {
                url: var("POSTGREST_URL").ok_or_else(|| anyhow!("POSTGREST_URL is required for the postgrest store"))?,
                api_key: var("POSTGREST_API_KEY").unwrap_or_default(),
            },
            Some(other) => return Err(anyhow!("unknown STORE_BACKEND `{other}` (memory | postgrest)")),
        };

        s.base_domain = var("TENANCY_BASE_DOMAIN");

        s.super_admin = match (var("SUPERADMIN_USERNAME"), lookup("SUPERADMIN_PASSWORD")) {
            (Some(username), Some(password)) if !password.is_empty() => Some(SuperAdminSeed {
                username,
                password,
                name: var("SUPERADMIN_NAME").unwrap_or_else(|| "Super Admin".to_string()),
            }),
            _ => None,
        };

        if let Some(rows) = var("CASES_MAX_UPLOAD_ROWS") {
            s.max_upload_rows = rows
                .parse()
                .with_context(|| format!("CASES_MAX_UPLOAD_ROWS `{rows}` is not a number"))?;
        }

        Ok(s)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Options of the tenant login (`company_admins` then `employees`).
    pub fn local_login(&self) -> LocalStrategyOptions {
        LocalStrategyOptions {
            identifier_field: "employee_id".to_string(),
            password_field: "password".to_string(),
            unknown_account_message: "Invalid credentials".to_string(),
            invalid_password_message: "Invalid employee ID or password".to_string(),
            bcrypt_cost: self.bcrypt_cost,
            ..LocalStrategyOptions::default()
        }
    }

    /// Options of the platform login (`super_admins`).
    pub fn super_admin_login(&self) -> LocalStrategyOptions {
        LocalStrategyOptions {
            identifier_field: "username".to_string(),
            password_field: "password".to_string(),
            unknown_account_message: "Invalid username or password".to_string(),
            invalid_password_message: "Invalid username or password".to_string(),
            bcrypt_cost: self.bcrypt_cost,
            ..LocalStrategyOptions::default()
        }
    }

    /// Mirrors the settings into the app's key/value config, where hooks
    /// read them, then layers `SHAKTI__*` overrides on top.
    pub fn apply(&self, app: &ShaktiApp<Value, ShaktiParams>) {
        app.set("app.environment", self.environment.as_str());
        app.set("http.host", self.http_host.as_str());
        app.set("http.port", self.http_port.to_string());
        app.set("cases.max_upload_rows", self.max_upload_rows.to_string());
        if let Some(domain) = &self.base_domain {
            app.set("tenancy.base_domain", domain.as_str());
        }
        let applied = app.load_env("SHAKTI__");
        if applied > 0 {
            tracing::debug!(applied, "applied SHAKTI__ overrides");
        }
    }
}
