pub mod authentication_accounts;
pub mod authentication_hooks;
pub mod authentication_service;
pub mod authentication_shared;

pub use authentication_service::AuthenticationService;
