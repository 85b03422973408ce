// Password login strategy.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use shakti_core::{ShaktiError, TenantContext};

use crate::options::LocalStrategyOptions;
use crate::password::verify_password;
use crate::principal::Principal;

/// A stored account as seen by a password strategy.
#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub principal: Principal,
    pub password_hash: String,
    pub active: bool,
}

/// Looks up one kind of account by its login identifier.
#[async_trait]
pub trait AccountResolver: Send + Sync {
    async fn resolve(&self, tenant: &TenantContext, identifier: &str) -> Result<Option<AccountRecord>>;
}

/// Identifier + password login against one or more account sources.
///
/// Resolvers are tried in order and the first account found is the only
/// one checked, so an identifier never falls through to a second source
/// after a wrong password.
pub struct LocalStrategy {
    name: String,
    options: LocalStrategyOptions,
    resolvers: Vec<Arc<dyn AccountResolver>>,
}

impl LocalStrategy {
    pub fn new(name: impl Into<String>, options: LocalStrategyOptions) -> Self {
        Self {
            name: name.into(),
            options,
            resolvers: Vec::new(),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn AccountResolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &LocalStrategyOptions {
        &self.options
    }

    pub fn verify_configuration(&self) -> Result<()> {
        if self.resolvers.is_empty() {
            return Err(anyhow::anyhow!("'{}' strategy has no account resolvers", self.name));
        }
        self.options
            .validate()
            .map_err(|e| anyhow::anyhow!("'{}' strategy: {e}", self.name))
    }

    /// Pulls `(identifier, password)` out of a login payload.
    pub fn credentials<'a>(&self, data: &'a Value) -> Result<(&'a str, &'a str)> {
        let field = |name: &str| {
            data.get(name)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };
        let identifier = field(&self.options.identifier_field);
        let password = data
            .get(&self.options.password_field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty());

        match (identifier, password) {
            (Some(i), Some(p)) => Ok((i, p)),
            _ => Err(ShaktiError::bad_request(format!(
                "`{}` and `{}` are required",
                self.options.identifier_field, self.options.password_field
            ))
            .into_anyhow()),
        }
    }

    pub async fn authenticate(&self, tenant: &TenantContext, identifier: &str, password: &str) -> Result<Principal> {
        let mut found = None;
        for resolver in &self.resolvers {
            if let Some(account) = resolver.resolve(tenant, identifier).await? {
                found = Some(account);
                break;
            }
        }

        let Some(account) = found else {
            tracing::warn!(strategy = %self.name, tenant = tenant.label(), "login for unknown account");
            return Err(ShaktiError::not_authenticated(self.options.unknown_account_message.clone()).into_anyhow());
        };

        if !verify_password(password, &account.password_hash) {
            tracing::warn!(strategy = %self.name, tenant = tenant.label(), account = %account.principal.id, "login with wrong password");
            return Err(ShaktiError::not_authenticated(self.options.invalid_password_message.clone()).into_anyhow());
        }

        if !account.active {
            return Err(ShaktiError::forbidden(self.options.inactive_message.clone()).into_anyhow());
        }

        Ok(account.principal)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::password::hash_password;
    use crate::principal::Role;

    struct Fixed(Option<AccountRecord>);

    #[async_trait]
    impl AccountResolver for Fixed {
        async fn resolve(&self, _tenant: &TenantContext, identifier: &str) -> Result<Option<AccountRecord>> {
            Ok(self
                .0
                .clone()
                .filter(|a| a.principal.username == identifier))
        }
    }

    fn account(username: &str, active: bool) -> AccountRecord {
        AccountRecord {
            principal: Principal {
                id: format!("id-{username}"),
                role: Role::Telecaller,
                tenant_id: Some("t1".into()),
                username: username.into(),
                name: "Test".into(),
                emp_id: Some(username.into()),
            },
            password_hash: hash_password("pw", 4).unwrap(),
            active,
        }
    }

    fn strategy(resolvers: Vec<AccountRecord>) -> LocalStrategy {
        let options = LocalStrategyOptions {
            identifier_field: "emp_id".into(),
            unknown_account_message: "Invalid credentials".into(),
            invalid_password_message: "Invalid employee ID or password".into(),
            bcrypt_cost: 4,
            ..Default::default()
        };
        resolvers
            .into_iter()
            .fold(LocalStrategy::new("local", options), |s, a| {
                s.with_resolver(Arc::new(Fixed(Some(a))))
            })
    }

    fn message(err: anyhow::Error) -> (u16, String) {
        let e = ShaktiError::from_anyhow(&err).unwrap();
        (e.code(), e.message.clone())
    }

    #[tokio::test]
    async fn first_matching_resolver_wins() {
        let s = strategy(vec![account("A1", true), account("A1", false)]);
        let p = s.authenticate(&TenantContext::new("t1"), "A1", "pw").await.unwrap();
        assert_eq!(p.id, "id-A1");
    }

    #[tokio::test]
    async fn failure_messages() {
        let s = strategy(vec![account("A1", true), account("B2", false)]);
        let t = TenantContext::new("t1");

        let err = s.authenticate(&t, "nobody", "pw").await.unwrap_err();
        assert_eq!(message(err), (401, "Invalid credentials".into()));

        let err = s.authenticate(&t, "A1", "wrong").await.unwrap_err();
        assert_eq!(message(err), (401, "Invalid employee ID or password".into()));

        let err = s.authenticate(&t, "B2", "pw").await.unwrap_err();
        assert_eq!(message(err).0, 403);
    }

    #[test]
    fn credentials_come_from_configured_fields() {
        let s = strategy(vec![account("A1", true)]);
        let data = json!({"emp_id": " A1 ", "password": "pw"});
        assert_eq!(s.credentials(&data).unwrap(), ("A1", "pw"));
        assert!(s.credentials(&json!({"emp_id": "A1"})).is_err());
        assert!(s.verify_configuration().is_ok());
    }
}
