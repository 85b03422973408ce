//! shakti-server: the multi-tenant loan collection backend.
//!
//! [`build`] wires settings, the table store, every service and the tenant
//! resolver into an axum app; `main.rs` only loads the environment and
//! listens.

pub mod bootstrap;
pub mod config;
pub mod hooks;
pub mod models;
pub mod services;
pub mod store;
pub mod tenancy;
pub mod utils;

use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use shakti_auth::TokenService;
use shakti_axum::{axum, AxumApp};
use shakti_core::ShaktiApp;

use crate::config::{Settings, StoreBackend};
use crate::services::{ShaktiParams, ShaktiState};
use crate::store::{MemoryStore, PostgrestStore, Store};
use crate::tenancy::StoreTenantResolver;

/// The store the settings ask for.
pub fn store_for(settings: &Settings) -> Arc<dyn Store> {
    match &settings.store {
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Postgrest { url, api_key } => {
            tracing::info!(url = %url, "using the PostgREST store");
            Arc::new(PostgrestStore::new(url.as_str(), api_key.as_str()))
        }
    }
}

pub fn build(settings: Settings, store: Arc<dyn Store>) -> Result<AxumApp<Value, ShaktiParams>> {
    let app: ShaktiApp<Value, ShaktiParams> = ShaktiApp::new();
    settings.apply(&app);
    hooks::global_hooks(&app);

    let state = Arc::new(ShaktiState {
        store: Arc::clone(&store),
        tokens: Arc::new(TokenService::new(settings.jwt.clone())),
        settings: Arc::new(settings),
    });
    let svcs = services::configure(&app, state)?;

    let mut ax = axum(app);
    for (name, svc) in svcs.all {
        ax = ax.use_service(name, svc);
    }

    Ok(ax
        .service("/health", || async { "ok" })
        .with_tenant_resolver(Arc::new(StoreTenantResolver::new(store))))
}
