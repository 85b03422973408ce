use anyhow::Result;
use serde_json::json;
use shakti_auth::hash_password;

use crate::config::Settings;
use crate::store::{Query, Store, Table};

/// Creates the configured super admin unless one with that username exists.
/// Returns whether an account was created.
pub async fn ensure_super_admin(store: &dyn Store, settings: &Settings) -> Result<bool> {
    let Some(seed) = &settings.super_admin else {
        return Ok(false);
    };

    let existing = store
        .select_one(&Query::new(Table::SuperAdmins).eq("username", seed.username.as_str()))
        .await?;
    if existing.is_some() {
        tracing::debug!(username = %seed.username, "super admin already present");
        return Ok(false);
    }

    let password_hash = hash_password(&seed.password, settings.bcrypt_cost)?;
    store
        .insert_one(
            Table::SuperAdmins,
            json!({
                "username": seed.username,
                "name": seed.name,
                "password_hash": password_hash,
            }),
        )
        .await?;
    tracing::info!(username = %seed.username, "created super admin");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SuperAdminSeed;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn seeds_once() {
        let store = MemoryStore::new();
        let settings = Settings {
            bcrypt_cost: 4,
            super_admin: Some(SuperAdminSeed {
                username: "root".into(),
                password: "s3cret".into(),
                name: "Root".into(),
            }),
            ..Settings::default()
        };

        assert!(ensure_super_admin(&store, &settings).await.unwrap());
        assert!(!ensure_super_admin(&store, &settings).await.unwrap());

        let rows = store.select(&Query::new(Table::SuperAdmins)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_ne!(rows[0]["password_hash"], "s3cret");
    }

    #[tokio::test]
    async fn nothing_to_do_without_a_seed() {
        let store = MemoryStore::new();
        assert!(!ensure_super_admin(&store, &Settings::default()).await.unwrap());
    }
}
