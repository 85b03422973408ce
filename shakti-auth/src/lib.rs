//! shakti-auth: roles, access tokens and password login.

pub mod hooks;
pub mod jwt;
pub mod options;
pub mod password;
pub mod principal;
pub mod strategy;

pub use hooks::{authorize, extract_bearer_token, AuthParams, Authenticate, RequireRole};
pub use jwt::{Claims, TokenService};
pub use options::{AuthConfigError, JwtOptions, LocalStrategyOptions};
pub use password::{generate_temporary_password, hash_password, verify_password};
pub use principal::{Principal, Role, UnknownRole};
pub use strategy::{AccountRecord, AccountResolver, LocalStrategy};
