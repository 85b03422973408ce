// Authentication options.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthConfigError {
    #[error("JWT secret must be at least {min} bytes")]
    WeakSecret { min: usize },
    #[error("JWT issuer cannot be empty")]
    EmptyIssuer,
    #[error("JWT audience cannot be empty")]
    EmptyAudience,
    #[error("Access token expiration must be greater than 0")]
    ZeroExpiry,
    #[error("bcrypt cost must be between 4 and 31, got {0}")]
    BcryptCost(u32),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct JwtOptions {
    /// HMAC signing secret.
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    #[serde(with = "humantime_serde")]
    pub access_token_expires_in: Duration,
}

impl Default for JwtOptions {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: "shakti".to_string(),
            audience: "shakti-api".to_string(),
            access_token_expires_in: Duration::from_secs(12 * 3600),
        }
    }
}

impl JwtOptions {
    pub const MIN_SECRET_LEN: usize = 16;

    pub fn validate(&self) -> Result<(), AuthConfigError> {
        if self.secret.len() < Self::MIN_SECRET_LEN {
            return Err(AuthConfigError::WeakSecret {
                min: Self::MIN_SECRET_LEN,
            });
        }
        if self.issuer.trim().is_empty() {
            return Err(AuthConfigError::EmptyIssuer);
        }
        if self.audience.trim().is_empty() {
            return Err(AuthConfigError::EmptyAudience);
        }
        if self.access_token_expires_in.is_zero() {
            return Err(AuthConfigError::ZeroExpiry);
        }
        Ok(())
    }
}

/// Messages and hashing settings for a password strategy.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalStrategyOptions {
    /// Request field holding the login identifier.
    pub identifier_field: String,
    pub password_field: String,
    /// Returned when no account matches the identifier.
    pub unknown_account_message: String,
    /// Returned when the account exists but the password is wrong.
    pub invalid_password_message: String,
    /// Returned for deactivated accounts with a correct password.
    pub inactive_message: String,
    pub bcrypt_cost: u32,
}

impl Default for LocalStrategyOptions {
    fn default() -> Self {
        Self {
            identifier_field: "username".to_string(),
            password_field: "password".to_string(),
            unknown_account_message: "Invalid login".to_string(),
            invalid_password_message: "Invalid login".to_string(),
            inactive_message: "Your account is inactive. Please contact your administrator.".to_string(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl LocalStrategyOptions {
    pub fn validate(&self) -> Result<(), AuthConfigError> {
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(AuthConfigError::BcryptCost(self.bcrypt_cost));
        }
        Ok(())
    }
}
