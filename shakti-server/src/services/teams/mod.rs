pub mod teams_schema;
pub mod teams_service;
pub mod teams_shared;

pub use teams_service::TeamsService;
