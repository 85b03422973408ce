//! shakti-core: framework-agnostic core of the Shakti collections backend.
//!
//! Services, the hook pipeline around them, the app container that wires
//! both together, tenant context and subdomain rules.

pub mod app;
pub mod config;
pub mod errors;
pub mod hooks;
pub mod registry;
pub mod service;
pub mod subdomain;
pub mod tenant;

pub use app::{ServiceCaller, ServiceHandle, ShaktiApp};
pub use config::{AppConfig, ConfigSnapshot};
pub use errors::{ErrorKind, ShaktiError, ShaktiResult};
pub use hooks::{
    AfterHook, AroundHook, BeforeHook, ErrorHook, HookContext, HookFut, HookResult, Next,
    ServiceHooks,
};
pub use registry::ServiceRegistry;
pub use service::{ServiceCapabilities, ServiceMethodKind, ShaktiService};
pub use tenant::{TenantContext, TenantId, TenantResolver};
