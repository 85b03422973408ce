pub mod cases_schema;
pub mod cases_service;
pub mod cases_shared;
pub mod cases_upload;

pub use cases_service::CasesService;
