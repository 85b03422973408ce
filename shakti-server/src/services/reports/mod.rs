pub mod reports_service;
pub mod reports_shared;

pub use reports_service::ReportsService;
