// Access tokens.

use anyhow::Result;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shakti_core::ShaktiError;
use uuid::Uuid;

use crate::options::JwtOptions;
use crate::principal::{Principal, Role};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    pub username: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emp_id: Option<String>,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl Claims {
    pub fn into_principal(self) -> Principal {
        Principal {
            id: self.sub,
            role: self.role,
            tenant_id: self.tenant_id,
            username: self.username,
            name: self.name,
            emp_id: self.emp_id,
        }
    }
}

/// Signs and verifies HS256 access tokens.
#[derive(Clone)]
pub struct TokenService {
    options: JwtOptions,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.options.issuer)
            .field("audience", &self.options.audience)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(options: JwtOptions) -> Self {
        let encoding = EncodingKey::from_secret(options.secret.as_bytes());
        let decoding = DecodingKey::from_secret(options.secret.as_bytes());
        Self {
            options,
            encoding,
            decoding,
        }
    }

    pub fn options(&self) -> &JwtOptions {
        &self.options
    }

    pub fn issue(&self, principal: &Principal) -> Result<String> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.options.access_token_expires_in.as_secs()).unwrap_or(i64::MAX / 2);
        let claims = Claims {
            sub: principal.id.clone(),
            role: principal.role,
            tenant_id: principal.tenant_id.clone(),
            username: principal.username.clone(),
            name: principal.name.clone(),
            emp_id: principal.emp_id.clone(),
            iss: self.options.issuer.clone(),
            aud: self.options.audience.clone(),
            iat: now,
            exp: now.saturating_add(ttl),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ShaktiError::general_error("Could not sign access token").with_source(e.into()).into_anyhow())
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.options.issuer.as_str()]);
        validation.set_audience(&[self.options.audience.as_str()]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "rejected access token");
                ShaktiError::not_authenticated("Invalid or expired access token").into_anyhow()
            })
    }
}
